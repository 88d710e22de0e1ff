use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{http::StatusCode, routing::get, Json, Router};
use chrono::{Duration, FixedOffset, TimeZone, Utc};
use std::time::Duration as StdDuration;
use reqwest::Client;
use serde_json::{json, Value};

use sensor_dashboard::{
    routes, source, HttpSource, Poller, RecordStore, SensorRecord, SensorState, StaticSource,
    StoreStatus, ViewSettings,
};

// ---

/// Serve `app` on an ephemeral local port and return its base URL.
async fn serve(app: Router) -> Result<String> {
    // ---
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Ok(format!("http://{}", addr))
}

/// 37 readings, one every 30 minutes from 2025-05-01 00:00 UTC, cycling
/// Bajo / Normal / Alto.
fn readings() -> Vec<SensorRecord> {
    // ---
    let start = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
    (0..37)
        .map(|i| SensorRecord {
            id: i,
            timestamp: start + Duration::minutes(30 * i),
            temperature: 20.0 + (i % 10) as f64,
            humidity: 40.0 + (i % 5) as f64,
            state: Some(SensorState::ALL[(i % 3) as usize]),
            action: if i % 2 == 0 {
                "Ventilador ON".to_string()
            } else {
                "Ventilador OFF".to_string()
            },
        })
        .collect()
}

async fn dashboard_app(records: Vec<SensorRecord>) -> Result<String> {
    // ---
    let store = Arc::new(RecordStore::new());
    source::refresh(&StaticSource::new(records), &store).await?;
    serve(routes::router(store, ViewSettings::default())).await
}

#[tokio::test]
async fn dashboard_reports_aggregates_and_history() -> Result<()> {
    // ---
    let base = dashboard_app(readings()).await?;
    let client = Client::new();

    let view: Value = client
        .get(format!("{}/dashboard", base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(view["status"], "ready");
    assert_eq!(view["total_records"], 37);
    assert_eq!(view["latest"]["id"], 36);
    assert_eq!(view["latest"]["state"], "Bajo");
    assert_eq!(view["latest"]["severity"], "low");

    let per_state = view["per_state"].as_array().unwrap();
    let states: Vec<_> = per_state.iter().map(|s| s["state"].clone()).collect();
    assert_eq!(states, vec![json!("Bajo"), json!("Normal"), json!("Alto")]);

    assert_eq!(view["state_counts"]["low"], 13);
    assert_eq!(view["state_counts"]["normal"], 12);
    assert_eq!(view["state_counts"]["high"], 12);
    assert_eq!(view["state_counts"]["undefined"], 0);

    // Latest is 18:00; the 12h window [06:00, 18:00) holds 24 half-hour readings.
    assert_eq!(view["history"]["points"].as_array().unwrap().len(), 24);
    assert_eq!(view["history"]["points"][0]["label"], "06:00");
    assert_eq!(view["history"]["has_older_data"], true);
    assert_eq!(view["recent"].as_array().unwrap().len(), 37);

    // One window back holds the remaining 12 readings and nothing older.
    let older: Value = client
        .get(format!("{}/dashboard?offset=1", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(older["history"]["points"].as_array().unwrap().len(), 12);
    assert_eq!(older["history"]["has_older_data"], false);

    let empty_offset: Value = client
        .get(format!("{}/dashboard?offset=", base))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(empty_offset["history"]["offset"], 0);
    assert_eq!(empty_offset["history"]["points"].as_array().unwrap().len(), 24);

    // Negative offsets clamp to the latest window.
    let clamped: Value = client
        .get(format!("{}/dashboard?offset=-4", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(clamped["history"]["offset"], 0);

    Ok(())
}

#[tokio::test]
async fn records_filter_and_paginate() -> Result<()> {
    // ---
    let base = dashboard_app(readings()).await?;
    let client = Client::new();

    let mut seen = Vec::new();
    for page in 1..=3 {
        let view: Value = client
            .get(format!("{}/records?page={}", base, page))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(view["total_pages"], 3);
        assert_eq!(view["total_matches"], 37);
        seen.push(view["records"].as_array().unwrap().len());
    }
    assert_eq!(seen, vec![15, 15, 7]);

    // Out-of-range page requests land on the last page.
    let last: Value = client
        .get(format!("{}/records?page=12", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(last["page"], 3);
    assert_eq!(last["records"][0]["id"], 6);

    let high: Value = client
        .get(format!("{}/records?status=alto&action=ventilador%20on", base))
        .send()
        .await?
        .json()
        .await?;
    let records = high["records"].as_array().unwrap();
    assert!(!records.is_empty());
    for r in records {
        assert_eq!(r["state"], "Alto");
        assert_eq!(r["action"], "Ventilador ON");
    }

    // Untouched form inputs arrive as empty values.
    let form: Value = client
        .get(format!(
            "{}/records?status=Todos&start_date=&end_date=&action=&page=",
            base
        ))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(form["page"], 1);
    assert_eq!(form["total_matches"], 37);
    assert_eq!(form["records"][0]["id"], 36);

    let bad_date: Value = client
        .get(format!("{}/records?start_date=not-a-date", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(bad_date["total_matches"], 37);
    assert_eq!(bad_date["warnings"][0]["field"], "start_date");

    let none: Value = client
        .get(format!("{}/records?start_date=2030-01-01", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(none["total_pages"], 0);
    assert_eq!(none["records"].as_array().unwrap().len(), 0);

    Ok(())
}

#[tokio::test]
async fn http_source_skips_malformed_records() -> Result<()> {
    // ---
    let upstream = Router::new().route(
        "/api/registros",
        get(|| async {
            Json(json!([
                { "id": 1, "fecha_hora": "2025-05-01T08:00:00Z", "temperatura": 20.0,
                  "humedad": 50.0, "estado": "Bajo", "accion": "Nada" },
                { "id": 2, "fecha_hora": "2025-05-01T09:00:00Z", "temperatura": "hot",
                  "humedad": 55.0, "estado": "Normal", "accion": "Nada" },
                { "id": 3, "fecha_hora": "2025-05-01T10:00:00", "temperatura": 30.0,
                  "humedad": 60.0, "accion": "Ventilador ON" }
            ]))
        }),
    );
    let upstream_url = format!("{}/api/registros", serve(upstream).await?);

    let store = Arc::new(RecordStore::new());
    let zone = FixedOffset::east_opt(0).unwrap();
    let http = HttpSource::new(upstream_url, zone, StdDuration::from_secs(5))?;
    let count = source::refresh(&http, &store).await?;
    assert_eq!(count, 2);

    let base = serve(routes::router(store, ViewSettings::default())).await?;
    let view: Value = Client::new()
        .get(format!("{}/dashboard", base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(view["latest"]["id"], 3);
    assert_eq!(view["latest"]["severity"], "medium");
    assert_eq!(view["state_counts"]["undefined"], 1);
    assert_eq!(view["averages"]["temperature"], 25.0);

    Ok(())
}

#[tokio::test]
async fn upstream_failure_is_reported_not_fatal() -> Result<()> {
    // ---
    let upstream = Router::new().route(
        "/api/registros",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    );
    let upstream_url = format!("{}/api/registros", serve(upstream).await?);

    let store = Arc::new(RecordStore::new());
    let zone = FixedOffset::east_opt(0).unwrap();
    let http = HttpSource::new(upstream_url, zone, StdDuration::from_secs(5))?;
    assert!(source::refresh(&http, &store).await.is_err());

    let base = serve(routes::router(store, ViewSettings::default())).await?;
    let client = Client::new();

    let view: Value = client
        .get(format!("{}/dashboard", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(view["status"], "error");
    assert_eq!(view["error"], "unexpected HTTP status 503");
    assert!(view["latest"].is_null());
    assert!(view["averages"].is_null());

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["data"], "error");
    assert_eq!(health["records"], 0);

    Ok(())
}

#[tokio::test]
async fn stalled_upstream_times_out_and_poller_stops() -> Result<()> {
    // ---
    let upstream = Router::new().route(
        "/api/registros",
        get(|| async {
            std::future::pending::<()>().await;
            StatusCode::OK
        }),
    );
    let upstream_url = format!("{}/api/registros", serve(upstream).await?);

    let zone = FixedOffset::east_opt(0).unwrap();
    let stalled = HttpSource::new(upstream_url, zone, StdDuration::from_millis(200))?;

    let store = Arc::new(RecordStore::new());
    let poller = Poller::spawn(stalled, store.clone(), StdDuration::from_millis(10));
    tokio::time::sleep(StdDuration::from_millis(600)).await;

    let state = store.current();
    assert_eq!(state.status(), StoreStatus::Error);
    assert!(state.last_error.unwrap().starts_with("request failed"));

    let stopped = tokio::time::timeout(StdDuration::from_secs(3), poller.stop()).await;
    assert!(stopped.is_ok(), "poller did not stop against a stalled upstream");

    Ok(())
}

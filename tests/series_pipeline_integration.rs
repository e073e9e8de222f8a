//! Integration tests for the chart pipeline
//!
//! These tests drive series through a real connection:
//! - Frame-rate series see one aggregated model per frame
//! - Full-rate series replay every raw message
//! - Detached series stop receiving

mod common;

use bot_dashboard::chart::{Chart, ChartOptions, Extractors, Series, SeriesOptions};
use bot_dashboard::types::GimbalAddr;
use bot_dashboard::{calibration, gimbal, BotModel};
use common::builders::*;
use common::mock_helpers::test_connection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

fn points(series: &Series) -> Vec<[f64; 2]> {
    series.buffer().lock().unwrap().as_plot_points()
}

fn drift_extractors() -> Extractors {
    Extractors::from_paths(
        "gimbal_status.message.GimbalControlStatus.drift_compensation.0",
        "gimbal_status.local_timestamp",
        "gimbal_status.local_timestamp",
    )
}

#[test]
fn test_frame_rate_series_takes_latest_per_frame() {
    let (conn, _sink, clock) = test_connection(1000.0);
    let chart = Chart::new(ChartOptions::default());
    let series = Series::attach(&chart, conn.events(), drift_extractors(), SeriesOptions::default());

    // Two messages in one frame: only the latest is charted
    conn.receive_json(&gimbal_status([1.0, 0.0]).to_string()).unwrap();
    clock.advance(10.0);
    conn.receive_json(&gimbal_status([2.0, 0.0]).to_string()).unwrap();
    conn.frame();

    // Frame with no new data does not duplicate the point
    conn.frame();

    clock.advance(10.0);
    conn.receive_json(&gimbal_status([3.0, 0.0]).to_string()).unwrap();
    conn.frame();

    assert_eq!(points(&series), vec![[960.0, 2.0], [970.0, 3.0]]);
}

#[test]
fn test_full_rate_series_sees_every_message() {
    let (conn, _sink, clock) = test_connection(0.0);
    let chart = Chart::new(ChartOptions::default());
    let options = SeriesOptions {
        full_data_rate: true,
        ..Default::default()
    };
    let series = Series::attach(&chart, conn.events(), drift_extractors(), options);

    for v in [5.0, -3.0, 10.0, 2.0] {
        clock.advance(100.0);
        conn.receive_json(&gimbal_status([v, 0.0]).to_string()).unwrap();
    }
    conn.frame();

    let values: Vec<f64> = points(&series).iter().map(|p| p[1]).collect();
    assert_eq!(values, vec![5.0, -3.0, 10.0, 2.0]);
    assert_eq!(series.buffer().lock().unwrap().bounds(), Some((-3.0, 10.0)));
    assert_eq!(chart.value_range(), Some((-3.0, 10.0)));
}

#[test]
fn test_full_rate_dedups_on_trigger() {
    let (conn, _sink, clock) = test_connection(0.0);
    let chart = Chart::new(ChartOptions::default());
    let extractors = Extractors::from_paths(
        "camera.object_detection.message.Command.CameraObjectDetection.detector_nsec",
        "camera.object_detection.local_timestamp",
        "camera.object_detection.message.Command.CameraObjectDetection.frame",
    )
    .scaled(1e-6);
    let series = Series::attach(
        &chart,
        conn.events(),
        extractors,
        SeriesOptions {
            full_data_rate: true,
            ..Default::default()
        },
    );

    for frame in [1, 1, 2, 2, 3] {
        clock.advance(5.0);
        conn.receive_json(&object_detection(frame, 4_000_000).to_string())
            .unwrap();
    }
    conn.frame();

    let recorded = points(&series);
    assert_eq!(recorded.len(), 3);
    let times: Vec<f64> = recorded.iter().map(|p| p[0]).collect();
    assert_eq!(times, vec![-45.0, -35.0, -25.0]);
    for point in &recorded {
        common::assert_float_eq(point[1], 4.0, 1e-9);
    }
}

#[test]
fn test_full_rate_replay_has_config_for_conversion() {
    let (conn, _sink, _clock) = test_connection(0.0);
    conn.receive_json(&config_is_current(sample_config()).to_string())
        .unwrap();
    conn.frame();

    let chart = Chart::new(ChartOptions::default());
    let force = Extractors::new(
        Box::new(|model: &BotModel| {
            let counts = model
                .get("winches.0.message.WinchStatus.1.sensors.force.measure")?
                .as_f64()?;
            calibration::force_to_kg(model, 0, counts)
        }),
        bot_dashboard::chart::number_at("winches.0.local_timestamp"),
        bot_dashboard::chart::value_at("winches.0.local_timestamp"),
    );
    let series = Series::attach(
        &chart,
        conn.events(),
        force,
        SeriesOptions {
            full_data_rate: true,
            no_bounds: true,
            ..Default::default()
        },
    );

    let status = serde_json::json!({"WinchStatus": [0, {"sensors": {"force": {"measure": 3500}}}]});
    conn.receive_json(&status.to_string()).unwrap();
    conn.frame();

    let recorded = points(&series);
    assert_eq!(recorded.len(), 1);
    common::assert_float_eq(recorded[0][1], 5.0, 1e-9);
    assert_eq!(chart.value_range(), None);
}

#[test]
fn test_gimbal_parameter_series() {
    let (conn, _sink, clock) = test_connection(0.0);
    let chart = Chart::new(ChartOptions::default());
    let addr = GimbalAddr::new(0x05, 1);
    let series = Series::attach(
        &chart,
        conn.events(),
        gimbal::series_extractors(addr),
        SeriesOptions::default(),
    );

    // Nothing until the parameter has been read
    conn.receive_json(&gimbal_value(GimbalAddr::new(0x06, 1), 1).to_string())
        .unwrap();
    conn.frame();
    assert!(points(&series).is_empty());

    clock.advance(100.0);
    conn.receive_json(&gimbal_value(addr, 42).to_string()).unwrap();
    conn.frame();
    assert_eq!(points(&series), vec![[50.0, 42.0]]);
}

#[test]
fn test_detach_stops_updates_and_leaves_chart() {
    let (conn, _sink, clock) = test_connection(0.0);
    let chart = Chart::new(ChartOptions::default());
    let mut series = Series::attach(&chart, conn.events(), drift_extractors(), SeriesOptions::default());
    assert_eq!(conn.events().frame.subscriber_count(), 1);

    conn.receive_json(&gimbal_status([1.0, 0.0]).to_string()).unwrap();
    conn.frame();
    series.detach();
    series.detach();

    clock.advance(10.0);
    conn.receive_json(&gimbal_status([2.0, 0.0]).to_string()).unwrap();
    conn.frame();

    assert_eq!(points(&series).len(), 1);
    assert_eq!(chart.series_count(), 0);
    assert_eq!(conn.events().frame.subscriber_count(), 0);
}

#[test]
fn test_series_detached_during_dispatch_skips_that_frame() {
    let (conn, _sink, clock) = test_connection(0.0);
    let chart = Chart::new(ChartOptions::default());
    let slot: Arc<Mutex<Option<Series>>> = Arc::new(Mutex::new(None));
    let detach_next = Arc::new(AtomicBool::new(false));

    // Subscribed first, so it runs before the series within each frame
    let _detacher = {
        let slot = Arc::clone(&slot);
        let detach_next = Arc::clone(&detach_next);
        conn.events().frame.subscribe(move |_| {
            if detach_next.load(Ordering::SeqCst) {
                if let Some(series) = slot.lock().unwrap().as_mut() {
                    series.detach();
                }
            }
        })
    };
    let series = Series::attach(&chart, conn.events(), drift_extractors(), SeriesOptions::default());
    let buffer = series.buffer();
    *slot.lock().unwrap() = Some(series);

    conn.receive_json(&gimbal_status([1.0, 0.0]).to_string()).unwrap();
    conn.frame();
    assert_eq!(buffer.lock().unwrap().len(), 1);
    assert_eq!(chart.total_points(), 1);

    detach_next.store(true, Ordering::SeqCst);
    clock.advance(10.0);
    conn.receive_json(&gimbal_status([2.0, 0.0]).to_string()).unwrap();
    assert_eq!(conn.events().frame.emit(&conn.model()), 2);

    assert_eq!(buffer.lock().unwrap().len(), 1);
    assert_eq!(chart.total_points(), 0);
    assert_eq!(conn.events().frame.subscriber_count(), 1);
    assert!(!slot.lock().unwrap().as_ref().unwrap().is_attached());
}

#[test]
fn test_dropping_series_unsubscribes() {
    let (conn, _sink, _clock) = test_connection(0.0);
    let chart = Chart::new(ChartOptions::default());
    {
        let _series = Series::attach(
            &chart,
            conn.events(),
            drift_extractors(),
            SeriesOptions {
                full_data_rate: true,
                ..Default::default()
            },
        );
        assert_eq!(conn.events().messages.subscriber_count(), 1);
    }
    assert_eq!(conn.events().messages.subscriber_count(), 0);
    assert_eq!(chart.series_count(), 0);
}

#[test]
fn test_chart_tick_prunes_scrolled_out_points() {
    let (conn, _sink, clock) = test_connection(0.0);
    let chart = Chart::new(ChartOptions {
        width_px: 10.0,
        millis_per_pixel: 10.0,
        ..Default::default()
    });
    let series = Series::attach(&chart, conn.events(), drift_extractors(), SeriesOptions::default());

    for i in 0..10 {
        clock.set(1000.0 + 50.0 * i as f64);
        conn.receive_json(&gimbal_status([i as f64, 0.0]).to_string())
            .unwrap();
        conn.frame();
    }
    chart.tick(1450.0);

    // Window is 100 ms: keep everything after 1350 plus one older point
    let times: Vec<f64> = points(&series).iter().map(|p| p[0]).collect();
    assert_eq!(times, vec![1300.0, 1350.0, 1400.0]);
}

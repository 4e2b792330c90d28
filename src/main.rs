use geoar::api::{ArSession, FrameInput};
use geoar::core::{GeoPosition, TICKS_PER_SECOND};
use geoar::layer::model::{
    Layer, Poi, PoiAction, PoiAnimation, PoiAnimations, PoiObject, PoiTransform, PoiVector3,
};
use geoar::scene::LayerUpdate;
use geoar::sensors::MockLocationSource;
use geoar::utils::config::{ConfigurationManager, EngineConfig};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const FRAME_RATE: i64 = 30;

fn demo_layer(device: GeoPosition) -> Layer {
    let lat = (device.latitude * 1_000_000.0) as i64;
    let lon = (device.longitude * 1_000_000.0) as i64;
    let spin = PoiAnimation {
        name: "spin".to_string(),
        kind: "rotate".to_string(),
        length: 4.0,
        repeat: true,
        from: 0.0,
        to: 360.0,
        axis: Some(PoiVector3 { x: 0.0, y: 1.0, z: 0.0 }),
        ..PoiAnimation::default()
    };
    let pulse = PoiAnimation {
        name: "pulse".to_string(),
        kind: "scale".to_string(),
        length: 1.0,
        interpolation: "cyclic".to_string(),
        from: 1.0,
        to: 1.5,
        axis: Some(PoiVector3 { x: 1.0, y: 1.0, z: 1.0 }),
        followed_by: "spin".to_string(),
        ..PoiAnimation::default()
    };

    let hotspots = (0..4)
        .map(|i| Poi {
            id: i + 1,
            title: format!("Marker {}", i + 1),
            lat: lat + 90 * (i - 2),
            lon: lon + 130 * (i % 2),
            relative_alt: 1.5,
            transform: Some(PoiTransform { rel: i == 0, angle: 0.0, scale: 1.0 }),
            poi_object: Some(PoiObject {
                full: "Cube".to_string(),
                ..PoiObject::default()
            }),
            animations: Some(PoiAnimations {
                on_create: vec![pulse.clone()],
                on_click: vec![spin.clone()],
                ..PoiAnimations::default()
            }),
            ..Poi::default()
        })
        .collect();

    Layer {
        layer: "demo".to_string(),
        hotspots,
        area_size: 40,
        area_width: 40,
        actions: vec![PoiAction {
            activity_message: "{F} fps, {N} objects, {A} animations at {LAT},{LON}".to_string(),
            ..PoiAction::default()
        }],
        ..Layer::default()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map_or("geoar", |s| s.as_str());

    let mut config_path = None;
    let mut layer_path = None;
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--config" => config_path = Some(rest.next().ok_or("--config needs a path")?),
            "--help" => {
                eprintln!("Usage: {} [layer.json] [--config engine.json]", program);
                return Ok(());
            }
            path => layer_path = Some(path),
        }
    }

    let config = match config_path {
        Some(path) => ConfigurationManager::from_file(path)?.config().clone(),
        None => EngineConfig::default(),
    };
    let device = config
        .tracking
        .fixed_position
        .unwrap_or(GeoPosition::new(48.158650, 11.578710));
    let layer = match layer_path {
        Some(path) => Layer::from_json(&std::fs::read_to_string(path)?)?,
        None => demo_layer(device),
    };

    let mut session = ArSession::new(config);
    let poller = session.spawn_location_poller(MockLocationSource::stationary(
        device.latitude,
        device.longitude,
        5.0,
    ))?;

    let handle = session.handle();
    let ticket = handle.feed().select_layer(&layer.layer);
    handle.deliver_layer(
        ticket,
        LayerUpdate {
            layers: vec![layer],
            ..LayerUpdate::default()
        },
    )?;

    let frame_ticks = TICKS_PER_SECOND / FRAME_RATE;
    let mut now = TICKS_PER_SECOND;
    for frame in 0..(FRAME_RATE * 5) {
        let report = session.update(FrameInput::at(now))?;
        if frame % FRAME_RATE == 0 {
            info!(
                state = ?report.state,
                objects = session.registry().len(),
                animations = session.engine().len(),
                information = report.information.as_deref().unwrap_or(""),
                "Frame"
            );
        }
        now += frame_ticks;
        std::thread::sleep(Duration::from_millis((1000 / FRAME_RATE) as u64));
    }

    for object in session.registry().objects() {
        let position = session.graph().world_position(object.wrapper);
        println!(
            "Object {} '{}': x={:.2} m east, y={:.2} m up, z={:.2} m north",
            object.id,
            object.poi.title,
            position.x,
            position.y,
            position.z
        );
    }

    poller.stop();
    Ok(())
}

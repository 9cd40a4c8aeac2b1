use spanmatch_engine::{Engine, Event, PatternConfig};

pub fn ev(name: &str, process: &str, thread: &str, start_ns: i64) -> Event {
    Event::builder()
        .name(name)
        .process(process)
        .thread(thread)
        .start_ns(start_ns)
        .build()
}

pub fn ev_args(
    name: &str,
    process: &str,
    thread: &str,
    start_ns: i64,
    args: &[(&str, &str)],
) -> Event {
    Event::builder()
        .name(name)
        .process(process)
        .thread(thread)
        .start_ns(start_ns)
        .args(
            args.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
        .build()
}

pub fn pair_rule(start: &str, stop: &str) -> PatternConfig {
    PatternConfig {
        start_name: Some(start.to_string()),
        stop_name: Some(stop.to_string()),
        ..PatternConfig::default()
    }
}

pub fn engine_with(config: PatternConfig) -> Engine {
    let mut engine = Engine::default();
    engine.add_pattern_rule(config).unwrap();
    engine
}

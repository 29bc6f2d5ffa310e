use log::{set_max_level, Level, Log, Metadata, Record};
use rand::distr::{Alphanumeric, SampleString};

pub fn rand_project() -> String {
    format!("project-{}", Alphanumeric.sample_string(&mut rand::rng(), 12))
}

pub fn reply_json(version: i64, flags: &[String], values: &[String]) -> String {
    format!(
        r#"{{"version": {version}, "flags": [{}], "values": [{}]}}"#,
        flags.join(","),
        values.join(",")
    )
}

pub fn constant_flag(name: &str, enabled: bool) -> String {
    format!(r#"{{"name": "{name}", "enabled": {enabled}, "overridden": true, "conditions": []}}"#)
}

pub fn plan_flag(name: &str, plan: &str) -> String {
    format!(
        r#"{{"name": "{name}", "enabled": true, "overridden": true, "conditions": [{}]}}"#,
        plan_condition(plan)
    )
}

pub fn plan_value(name: &str, default: i64, with_override: i64, plan: &str) -> String {
    format!(
        r#"{{"name": "{name}", "enabled": true, "overridden": true, "value_default": {default}, "value_override": {with_override}, "conditions": [{}]}}"#,
        plan_condition(plan)
    )
}

fn plan_condition(plan: &str) -> String {
    format!(
        r#"{{"checks": [{{"variable": {{"name": "plan", "type": 1}}, "operator": 1, "value": "{plan}"}}]}}"#
    )
}

pub struct PrintLog {}

impl Log for PrintLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.target().contains("featureflags")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "[ERROR]",
            Level::Warn => "[WARN]",
            Level::Info => "[INFO]",
            Level::Debug => "[DEBUG]",
            Level::Trace => "[TRACE]",
        };
        println!("{level} {}", record.args());
    }

    fn flush(&self) {}
}

pub fn log_init() {
    set_max_level(log::LevelFilter::Debug);
    _ = log::set_logger(&PrintLog {});
}

// [libs/shared/panopticon/src/lib.rs]
/*!
 * APARATO: PANOPTICON OBSERVER
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4)
 * RESPONSABILIDAD: INICIALIZACIÓN DE TRAZAS Y CAPTURA DE PÁNICOS
 *
 * Single initialization point for every Custodes binary. Development
 * gets a readable compact layer; production gets flattened JSON so log
 * aggregation doesn't need a multiline parser.
 */

use std::panic;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber for `service_name`, and
/// installs a panic hook that logs the panic location through `tracing`
/// before the default hook runs (so panics in worker threads still show
/// up in the structured log stream, not just stderr).
pub fn init_tracing(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{service_name}={level},tower_http=warn,hyper=warn",
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    let is_production = !cfg!(debug_assertions);

    if is_production {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false))
            .init();
    }

    let service = service_name.to_string();
    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        tracing::error!(target: "panic", service = %service, location = %location, "panic: {info}");
    }));
}

//! Log output for tools built on the toolkit.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::FmtSpan;

/// Install a `fmt` subscriber filtered by `RUST_LOG` plus `default_directive`
/// (for example `"rvkit_frame=debug"`).
///
/// An unparsable directive is ignored, as is a second call once a global
/// subscriber is installed.
pub fn init(default_directive: &str) {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = default_directive.parse::<Directive>() {
        filter = filter.add_directive(directive);
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

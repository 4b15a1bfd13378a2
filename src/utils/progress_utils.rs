use indicatif::ProgressStyle;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

pub fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{span_child_prefix}[{elapsed_precise} / {eta_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {span_name}"
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("##-")
}

/// Turns `span` into a progress bar of `len` steps. A no-op unless the
/// indicatif layer is installed.
pub fn track(span: &Span, len: u64) {
    span.pb_set_style(&progress_style());
    span.pb_set_length(len);
}

pub fn advance(span: &Span, steps: u64) {
    span.pb_inc(steps);
}

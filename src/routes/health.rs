/// GET /health - liveness probe, answers with the running version
pub async fn health() -> &'static str {
    concat!("roadtale ", env!("CARGO_PKG_VERSION"))
}

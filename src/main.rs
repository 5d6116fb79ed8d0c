#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "/".to_string());
    hero_ngin::site::start(&path)
}

// The web build starts through the library's wasm entry point.
#[cfg(target_arch = "wasm32")]
fn main() {}

use parley::config::apply_env_lines;

/// Bundled config for web and mobile builds
const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

#[cfg(not(target_arch = "wasm32"))]
fn load_dotenv() {
    // First try to load from .env file (desktop dev)
    if dotenvy::dotenv().is_ok() {
        return;
    }

    // Fall back to bundled config (mobile builds)
    apply_env_lines(BUNDLED_CONFIG);
}

#[cfg(target_arch = "wasm32")]
fn load_dotenv() {
    apply_env_lines(BUNDLED_CONFIG);
}

fn main() {
    load_dotenv();
    // Logging goes through the tracing subscriber `launch` installs.
    dioxus::launch(parley::ui::App);
}

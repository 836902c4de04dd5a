fn main() {
    // The Tauri context is only generated for the desktop shell; the console
    // core builds and tests without the platform webview toolchain.
    #[cfg(feature = "desktop")]
    {
        tauri_build::build();
    }
}

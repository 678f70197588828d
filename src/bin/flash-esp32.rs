//! Build the relay firmware and flash it to an ESP32.
//!
//! Usage: `WIFI_SSID="MyNetwork" WIFI_PASSWORD="secret" cargo run --bin flash-esp32`
//!
//! The WiFi variables are read at compile time by the firmware build, so they
//! must be set when this helper runs. The serial port is auto-detected; set
//! `ESPFLASH_PORT` to override it.

use std::process::{exit, Command};

const TARGET: &str = "xtensa-esp32-espidf";
const FIRMWARE_BIN: &str = "distance-relay";

/// Serial device patterns of common USB-UART bridges.
const PORT_PATTERNS: [&str; 5] = [
    "/dev/cu.usbserial-*",
    "/dev/cu.wchusbserial*",
    "/dev/cu.SLAB_USBtoUART*",
    "/dev/ttyUSB*",
    "/dev/ttyACM*",
];

/// First serial port matching [`PORT_PATTERNS`].
fn find_esp32_port() -> Option<String> {
    PORT_PATTERNS.iter().find_map(|pattern| {
        glob::glob(pattern)
            .ok()?
            .flatten()
            .next()
            .map(|path| path.to_string_lossy().to_string())
    })
}

fn main() {
    if std::env::var_os("WIFI_SSID").is_none() {
        println!("Note: WIFI_SSID not set, the status page will be disabled.\n");
    }

    println!("=== Building {} for {} ===\n", FIRMWARE_BIN, TARGET);

    let status = Command::new("cargo")
        .args([
            "build",
            "--bin",
            FIRMWARE_BIN,
            "--release",
            "--target",
            TARGET,
            "--features",
            "esp32",
        ])
        .status();

    if !matches!(status, Ok(s) if s.success()) {
        eprintln!("\nBuild failed!");
        exit(1);
    }

    println!("\n=== Flashing to device ===\n");

    let image = format!("target/{}/release/{}", TARGET, FIRMWARE_BIN);
    let mut flash = Command::new("espflash");
    flash.args(["flash", "--monitor"]);

    match std::env::var("ESPFLASH_PORT").ok().or_else(find_esp32_port) {
        Some(port) => {
            println!("Using serial port {}", port);
            flash.args(["--port", port.as_str()]);
        }
        None => println!("No serial port found, letting espflash choose"),
    }

    let status = flash.arg(&image).status();
    if !matches!(status, Ok(s) if s.success()) {
        eprintln!("\nFlash failed!");
        exit(1);
    }
}

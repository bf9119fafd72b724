use std::path::{Path, PathBuf};

/// Exported Edge Impulse C++ library (Arduino/C++ export, unzipped here).
const SDK_DIR: &str = "toaster-inferencing";
const SHIM: &str = "ffi/ei_shim.cpp";
/// Must match `EI_LABEL_COUNT` in src/config.rs.
const LABEL_COUNT: &str = "1";

fn main() {
    // Host builds (unit tests) have no ESP-IDF environment to export.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }

    if std::env::var("CARGO_FEATURE_EDGE_IMPULSE").is_ok() {
        // Find the C++ compiler in the Embuild toolchain directory
        // Typically: .embuild/espressif/tools/riscv32-esp-elf/esp-<VER>/riscv32-esp-elf/bin/riscv32-esp-elf-g++
        let compiler = find_compiler().unwrap_or_else(|| "riscv32-esp-elf-g++".into());
        build_ei(&compiler);
    }
}

fn find_compiler() -> Option<PathBuf> {
    // Check local .embuild first, then global ~/.espressif
    let search_dirs = [
        std::env::var("CARGO_MANIFEST_DIR").ok().map(|d| PathBuf::from(d).join(".embuild")),
        dirs::home_dir().map(|h| h.join(".espressif")),
    ];

    for root in search_dirs.into_iter().flatten() {
        let tools_dir = root.join("espressif/tools/riscv32-esp-elf");
        let Ok(entries) = std::fs::read_dir(&tools_dir) else {
            continue;
        };
        // Versioned directory, e.g. esp-13.2.0_20240530
        for entry in entries.flatten() {
            let candidate = entry.path().join("riscv32-esp-elf/bin/riscv32-esp-elf-g++");
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    None
}

fn build_ei(compiler_path: &Path) {
    let sdk_root = PathBuf::from(SDK_DIR);

    let mut build = cc::Build::new();
    build
        .cpp(true)
        .compiler(compiler_path)
        .flag("-std=c++14")
        .flag("-O3")
        .define("EI_CLASSIFIER_TFLITE_ENABLE_CMSIS_NN", "0")
        .define("EI_NATIVE_ARCH", "1")
        .define("TOAST_LABEL_COUNT", LABEL_COUNT)
        .include(&sdk_root)
        .include(sdk_root.join("src"))
        .include(sdk_root.join("src/edge-impulse-sdk"))
        .include(sdk_root.join("src/model-parameters"))
        .include(sdk_root.join("src/tflite-model"))
        .file(SHIM);

    add_source_files(&mut build, &sdk_root.join("src"));

    build.compile("edge-impulse-sdk");

    println!("cargo:rerun-if-changed={}", SDK_DIR);
    println!("cargo:rerun-if-changed={}", SHIM);
}

fn add_source_files(build: &mut cc::Build, dir: &Path) {
    let entries = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", dir.display(), e));

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            add_source_files(build, &path);
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("c" | "cpp" | "cc")
        ) {
            build.file(&path);
        }
    }
}

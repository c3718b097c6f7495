use std::env;
use std::path::PathBuf;

#[allow(dead_code)]
/// Print a boxed error message for visibility in cargo output
fn print_env_error(title: &str, details: &[&str], fixes: &[&str]) {
    eprintln!();
    eprintln!("╔══════════════════════════════════════════════════════════════════╗");
    eprintln!("║ BH1730 BUILD ERROR: {:<45} ║", title);
    eprintln!("╠══════════════════════════════════════════════════════════════════╣");
    for detail in details {
        eprintln!("║ {:<66} ║", detail);
    }
    eprintln!("╠══════════════════════════════════════════════════════════════════╣");
    eprintln!("║ HOW TO FIX:                                                      ║");
    for fix in fixes {
        eprintln!("║   {:<64} ║", fix);
    }
    eprintln!("╚══════════════════════════════════════════════════════════════════╝");
    eprintln!();
}

#[allow(dead_code)]
/// Check common install locations for the driver library
fn find_bh1730_lib() -> Option<PathBuf> {
    let candidates = ["/opt/bh1730/lib", "/usr/local/lib", "/usr/lib"];

    for path in &candidates {
        let p = PathBuf::from(path);
        if p.join("libbh1730.a").exists() || p.join("libbh1730.so").exists() {
            return Some(p);
        }
    }
    None
}

fn main() {
    let out_path = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    #[cfg(feature = "native-driver")]
    {
        println!("cargo:rerun-if-env-changed=BH1730_LIB_DIR");
        println!("cargo:rerun-if-changed=include/bh1730.h");

        let lib_dir = match env::var("BH1730_LIB_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => {
                if let Some(found) = find_bh1730_lib() {
                    println!(
                        "cargo:warning=BH1730_LIB_DIR not set, auto-detected: {}",
                        found.display()
                    );
                    found
                } else {
                    print_env_error(
                        "BH1730_LIB_DIR not set",
                        &[
                            "The native-driver feature links against libbh1730.",
                            "No library was found in the standard locations.",
                        ],
                        &[
                            "export BH1730_LIB_DIR=/path/to/lib",
                            "Or build without --features native_driver",
                        ],
                    );
                    panic!("BH1730_LIB_DIR must be set when `native-driver` is enabled.");
                }
            }
        };

        let bindings = bindgen::Builder::default()
            .header("include/bh1730.h")
            .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
            .allowlist_function("bh1730_.*")
            .allowlist_function("mgos_bh1730_init")
            .allowlist_type("bh1730_t")
            .generate()
            .expect("Unable to generate bindings");

        bindings
            .write_to_file(out_path.join("bindings.rs"))
            .expect("Couldn't write bindings!");

        println!("cargo:rustc-link-search=native={}", lib_dir.display());
        println!("cargo:rustc-link-lib=bh1730");
    }
    #[cfg(not(feature = "native-driver"))]
    {
        std::fs::write(
            out_path.join("bindings.rs"),
            "// Native driver not enabled; no bindings generated.\n",
        )
        .expect("Couldn't write placeholder bindings!");
    }
}

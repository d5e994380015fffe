use std::env;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ini::Ini;

fn main() {
    let base_path: PathBuf = env::var("OUT_DIR").unwrap().into();
    let ini_dir = "data/";
    println!("cargo:rerun-if-changed={}", ini_dir);

    for entry in std::fs::read_dir(ini_dir).expect("failed to read data dir") {
        let entry = entry.expect("error reading directory entry");
        let ini_path = entry.path();
        // Only try to read *.ini
        if ini_path.extension().map(|ext| ext != "ini").unwrap_or(true) {
            continue;
        }

        let ini = Ini::load_from_file(&ini_path).unwrap();
        generate_conversions(&ini, &base_path)
            .unwrap_or_else(|e| panic!("Failed to generate conversions from {:?}: {}", ini_path, e));
    }
}

/// Emit `AsRef<str>` and `TryFrom<&str>` impls for a fieldless enum.
///
/// Lookups go through a perfect hash map keyed on the lowercased standard spelling, so parsing
/// is case-insensitive while `as_ref` always yields the standard capitalization.
fn generate_conversions(ini: &Ini, base_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let general = ini.general_section();
    let out_path = base_path.join(
        general
            .get("file")
            .ok_or("file property missing from ini general section")?,
    );
    let type_name = general
        .get("type")
        .ok_or("type property missing from ini general section")?;
    let values = ini
        .section(Some("values"))
        .ok_or("values section missing from ini")?;

    let mut out = BufWriter::new(File::create(&out_path)?);
    let mut map = phf_codegen::Map::<String>::new();

    writeln!(
        &mut out,
        "impl std::convert::AsRef<str> for {t} {{
    fn as_ref(&self) -> &str {{
        match self {{",
        t = type_name
    )?;
    for (variant, repr) in values.iter() {
        writeln!(&mut out, "            {}::{} => \"{}\",", type_name, variant, repr)?;
        map.entry(
            repr.to_ascii_lowercase(),
            &format!("{}::{}", type_name, variant),
        );
    }
    writeln!(&mut out, "        }}\n    }}\n}}\n")?;

    writeln!(
        &mut out,
        "impl std::convert::TryFrom<&str> for {t} {{
    type Error = ();

    fn try_from(s: &str) -> Result<Self, Self::Error> {{
        static MAP: phf::Map<&'static str, {t}> = {m};

        MAP.get(s.to_ascii_lowercase().as_str()).copied().ok_or(())
    }}
}}",
        t = type_name,
        m = map.build()
    )?;
    Ok(())
}

// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fs;
use std::path::{ Path, PathBuf };

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

use crate::core::parallel::DEFAULT_CHUNK_SIZE;
use crate::math::constants::Float;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// One photon-shooting job.
#[derive(Clone, Debug, PartialEq)]
pub struct ShootConfig {
    /// Image resampled into photons.
    pub source: PathBuf,
    /// Optional image convolved with the source photons.
    pub kernel: Option<PathBuf>,
    pub output: PathBuf,
    pub photons: usize,
    pub seed: u64,
    /// Pixel-split mode for the source when positive.
    pub max_flux: Float,
    pub trials: usize,
    pub chunk_size: usize,
    pub parallel: bool,
    /// Linearise 8-bit inputs as sRGB.
    pub srgb: bool,
}

impl ShootConfig {
    pub fn new(source: PathBuf, output: PathBuf) -> Self {
        Self {
            source,
            kernel: None,
            output,
            photons: 10000,
            seed: 0,
            max_flux: 0.0,
            trials: 1,
            chunk_size: DEFAULT_CHUNK_SIZE,
            parallel: false,
            srgb: false,
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ShootConfig, ConfigError> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let config = parse_config(&xml, base_dir)?;
    log::info!("Loaded shoot job from {}: {} photons, {} trial(s).",
               path.display(), config.photons, config.trials);
    Ok(config)
}

pub fn parse_config(xml: &str, base_dir: &Path) -> Result<ShootConfig, ConfigError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut defaults: HashMap<String, String> = HashMap::new();
    let mut params: HashMap<String, (String, String)> = HashMap::new();
    let mut in_shoot = false;
    let mut seen_shoot = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let mut name: Option<String> = None;
                let mut value: Option<String> = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => name = Some(attr.unescape_value().unwrap_or_default().to_string()),
                        b"value" => value = Some(attr.unescape_value().unwrap_or_default().to_string()),
                        _ => {}
                    }
                }
                match tag.as_str() {
                    "shoot" => {
                        in_shoot = true;
                        seen_shoot = true;
                    }
                    "default" => {
                        if let (Some(k), Some(v)) = (name, value) {
                            defaults.insert(k, v);
                        }
                    }
                    "string" | "integer" | "float" | "boolean" if in_shoot => {
                        let name = name.ok_or_else(|| ConfigError::Parse(format!("<{}> without name", tag)))?;
                        let value = value.ok_or_else(|| ConfigError::Parse(format!("<{}> without value", tag)))?;
                        params.insert(name, (tag.clone(), resolve_value(&value, &defaults)));
                    }
                    other => log::warn!("Ignoring unknown element <{}>.", other),
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"shoot" {
                    in_shoot = false;
                }
            }
            Err(e) => {
                return Err(ConfigError::Parse(e.to_string()));
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_shoot {
        return Err(ConfigError::Parse("missing <shoot> element".to_string()));
    }

    let source = params.get("source").map(|(_, v)| base_dir.join(v))
        .ok_or(ConfigError::MissingField("source"))?;
    let output = params.get("output").map(|(_, v)| base_dir.join(v))
        .ok_or(ConfigError::MissingField("output"))?;
    let mut config = ShootConfig::new(source, output);

    for (name, (tag, value)) in &params {
        match name.as_str() {
            "source" | "output" => {}
            "kernel" => config.kernel = Some(base_dir.join(value)),
            "photons" => config.photons = parse_usize(name, value)?,
            "seed" => config.seed = parse_u64(name, value)?,
            "max_flux" => config.max_flux = parse_float(name, value)?,
            "trials" => config.trials = parse_usize(name, value)?.max(1),
            "chunk_size" => config.chunk_size = parse_usize(name, value)?.max(1),
            "parallel" => config.parallel = parse_bool(name, value)?,
            "srgb" => config.srgb = parse_bool(name, value)?,
            _ => log::warn!("Ignoring unknown <{} name=\"{}\">.", tag, name),
        }
    }

    Ok(config)
}

fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = raw.to_string();
    for (k, v) in defaults {
        out = out.replace(&format!("${}", k), v);
    }
    out
}

fn invalid(name: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue { name: name.to_string(), value: value.to_string() }
}

fn parse_float(name: &str, value: &str) -> Result<Float, ConfigError> {
    value.trim().parse::<Float>().map_err(|_| invalid(name, value))
}

fn parse_usize(name: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| invalid(name, value))
}

fn parse_u64(name: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| invalid(name, value))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(invalid(name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_job() {
        let xml = r#"
<shoot>
    <default name="n" value="2500"/>
    <string name="source" value="galaxy.exr"/>
    <string name="kernel" value="psf.exr"/>
    <string name="output" value="out/render.exr"/>
    <integer name="photons" value="$n"/>
    <integer name="seed" value="7"/>
    <float name="max_flux" value="0.5"/>
    <integer name="trials" value="3"/>
    <boolean name="parallel" value="true"/>
</shoot>
"#;
        let config = parse_config(xml, Path::new("/data")).expect("parse job");
        assert_eq!(config.source, PathBuf::from("/data/galaxy.exr"));
        assert_eq!(config.kernel, Some(PathBuf::from("/data/psf.exr")));
        assert_eq!(config.output, PathBuf::from("/data/out/render.exr"));
        assert_eq!(config.photons, 2500);
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_flux, 0.5);
        assert_eq!(config.trials, 3);
        assert!(config.parallel);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn defaults_apply() {
        let xml = r#"<shoot><string name="source" value="a.png"/><string name="output" value="b.exr"/></shoot>"#;
        let config = parse_config(xml, Path::new(".")).unwrap();
        assert_eq!(config.photons, 10000);
        assert_eq!(config.kernel, None);
        assert!(!config.parallel);
        assert_eq!(config.trials, 1);
    }

    #[test]
    fn missing_output_is_reported() {
        let xml = r#"<shoot><string name="source" value="a.exr"/></shoot>"#;
        let err = parse_config(xml, Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("output")));
    }

    #[test]
    fn bad_number_is_reported() {
        let xml = r#"<shoot>
            <string name="source" value="a.exr"/>
            <string name="output" value="b.exr"/>
            <integer name="photons" value="-3"/>
        </shoot>"#;
        let err = parse_config(xml, Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn load_config_from_file() {
        let mut path = std::env::temp_dir();
        path.push("photonarray_load_config_from_file.xml");
        std::fs::write(&path, r#"<shoot><string name="source" value="s.exr"/><string name="output" value="o.exr"/><integer name="seed" value="12"/></shoot>"#)
            .expect("write job");
        let config = load_config(&path).expect("load job");
        assert_eq!(config.seed, 12);
        assert_eq!(config.source, std::env::temp_dir().join("s.exr"));
    }
}

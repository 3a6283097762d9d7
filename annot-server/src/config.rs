//! Command-line configuration and startup validation

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use annot_common::{AnnotationMode, Error, Result};
use clap::Parser;

/// Conventional group side-file name inside the data directory
pub const DEFAULT_GROUP_FILE: &str = "groups.json";

/// Command-line arguments for annot-server
#[derive(Parser, Debug, Clone)]
#[command(name = "annot-server")]
#[command(about = "Image annotation server (text or bounding box)")]
#[command(version)]
pub struct Args {
    /// Directory containing the images to annotate
    #[arg(long, env = "ANNOT_DATA_DIR")]
    pub data_dir: PathBuf,

    /// JSON file the annotations are written to (created if absent)
    #[arg(long, env = "ANNOT_OUTPUT_FILE")]
    pub output_file: PathBuf,

    /// Annotation kind: text or bbox
    #[arg(long, default_value = "text", env = "ANNOT_MODE")]
    pub mode: AnnotationMode,

    /// Category (text) or intention (bbox) side-file
    /// [default: <data-dir>/categories.json or <data-dir>/intentions.json]
    #[arg(
        long,
        visible_aliases = ["category-file", "intention-file"],
        env = "ANNOT_METADATA_FILE"
    )]
    pub metadata_file: Option<PathBuf>,

    /// Group side-file [default: <data-dir>/groups.json]
    #[arg(long, env = "ANNOT_GROUP_FILE")]
    pub group_file: Option<PathBuf>,

    /// Directory with example.json and reference images
    #[arg(long, env = "ANNOT_EXAMPLE_DIR")]
    pub example_dir: Option<PathBuf>,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "ANNOT_HOST")]
    pub host: IpAddr,

    /// Port to listen on [default: 5000 for text, 5001 for bbox]
    #[arg(short, long, env = "ANNOT_PORT")]
    pub port: Option<u16>,
}

/// Validated server configuration with all defaults resolved
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Canonical data directory
    pub data_dir: PathBuf,
    /// Absolute output file path
    pub output_file: PathBuf,
    pub mode: AnnotationMode,
    pub metadata_file: PathBuf,
    /// Group side-file; None when no such file exists
    pub group_file: Option<PathBuf>,
    pub example_dir: Option<PathBuf>,
    pub addr: SocketAddr,
}

impl ServerConfig {
    /// Resolve defaults and validate paths
    pub fn from_args(args: Args) -> Result<Self> {
        if !args.data_dir.is_dir() {
            return Err(Error::Config(format!(
                "{} is not a valid directory",
                args.data_dir.display()
            )));
        }
        let data_dir = args.data_dir.canonicalize()?;

        let output_file = std::path::absolute(&args.output_file)?;
        if output_file.is_dir() {
            return Err(Error::Config(format!(
                "Output file {} is a directory",
                output_file.display()
            )));
        }
        match output_file.parent() {
            Some(parent) if parent.is_dir() => {}
            _ => {
                return Err(Error::Config(format!(
                    "Parent directory of output file {} does not exist",
                    output_file.display()
                )))
            }
        }

        let metadata_file = args
            .metadata_file
            .map(std::path::absolute)
            .transpose()?
            .unwrap_or_else(|| data_dir.join(args.mode.default_metadata_file()));

        let group_file = args
            .group_file
            .map(std::path::absolute)
            .transpose()?
            .unwrap_or_else(|| data_dir.join(DEFAULT_GROUP_FILE));
        let group_file = group_file.is_file().then_some(group_file);

        Ok(Self {
            data_dir,
            output_file,
            mode: args.mode,
            metadata_file,
            group_file,
            example_dir: args.example_dir.filter(|dir| dir.is_dir()),
            addr: SocketAddr::new(
                args.host,
                args.port.unwrap_or_else(|| args.mode.default_port()),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(data: &std::path::Path, extra: &[&str]) -> Args {
        let output = data.join("out.json");
        let mut argv = vec![
            "annot-server".to_string(),
            "--data-dir".to_string(),
            data.display().to_string(),
            "--output-file".to_string(),
            output.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_for_text_mode() {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig::from_args(args(dir.path(), &[])).unwrap();

        assert_eq!(config.mode, AnnotationMode::Text);
        assert_eq!(config.metadata_file.file_name().unwrap(), "categories.json");
        assert_eq!(config.group_file, None);
        assert_eq!(config.addr.port(), 5000);
        assert!(config.output_file.is_absolute());
    }

    #[test]
    fn test_bbox_mode_defaults_to_intentions() {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig::from_args(args(dir.path(), &["--mode", "bbox"])).unwrap();
        assert_eq!(config.metadata_file.file_name().unwrap(), "intentions.json");
    }

    #[test]
    fn test_port_default_follows_mode() {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig::from_args(args(dir.path(), &["--mode", "bbox"])).unwrap();
        assert_eq!(config.addr.port(), 5001);

        let config = ServerConfig::from_args(args(dir.path(), &["--mode", "bbox", "--port", "7000"]))
            .unwrap();
        assert_eq!(config.addr.port(), 7000);
    }

    #[test]
    fn test_category_file_alias() {
        let dir = TempDir::new().unwrap();
        let custom = dir.path().join("cats.json");
        let config = ServerConfig::from_args(args(
            dir.path(),
            &["--category-file", &custom.display().to_string()],
        ))
        .unwrap();
        assert_eq!(config.metadata_file, custom);
    }

    #[test]
    fn test_group_file_detected_in_data_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DEFAULT_GROUP_FILE), "{}").unwrap();
        let config = ServerConfig::from_args(args(dir.path(), &[])).unwrap();
        assert!(config.group_file.is_some());
    }

    #[test]
    fn test_missing_data_dir_is_config_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = ServerConfig::from_args(args(&missing, &[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_mode_rejected_by_parser() {
        let result = Args::try_parse_from([
            "annot-server",
            "--data-dir",
            "/tmp",
            "--output-file",
            "/tmp/out.json",
            "--mode",
            "polygon",
        ]);
        assert!(result.is_err());
    }
}

//! 命令行参数

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// ZDXF - 将项目图层导出为 DXF
#[derive(Parser, Debug)]
#[command(name = "zdxf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// 配置文件路径（默认读取当前目录下的 zdxf.toml，如果存在）
    #[arg(short, long, env = "ZDXF_CONFIG")]
    pub config: Option<PathBuf>,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", env = "ZDXF_LOG_LEVEL")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 导出项目图层为 DXF
    Export(ExportArgs),

    /// 规范化已有 DXF 文件的版本与单位
    Normalize(NormalizeArgs),

    /// 列出项目中的图层
    Layers(LayersArgs),
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// 项目快照（JSON）
    #[arg(short, long)]
    pub project: PathBuf,

    /// 输出路径，缺少 .dxf 扩展名时自动追加
    #[arg(short, long)]
    pub output: PathBuf,

    /// 按名称选择图层，可重复；不指定时导出所有可见图层
    #[arg(long = "layer", value_name = "NAME")]
    pub layers: Vec<String>,

    /// 比例尺分母
    #[arg(long)]
    pub scale: Option<u32>,

    /// 坐标系，如 EPSG:5514
    #[arg(long)]
    pub crs: Option<String>,
}

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// 输入 DXF 文件
    pub input: PathBuf,

    /// 输出文件；不指定时原地替换
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 需要替换的版本标记
    #[arg(long)]
    pub source_version: Option<String>,

    /// 目标版本标记
    #[arg(long)]
    pub target_version: Option<String>,

    /// 单位名称或 $INSUNITS 代码
    #[arg(long)]
    pub units: Option<String>,
}

#[derive(Args, Debug)]
pub struct LayersArgs {
    /// 项目快照（JSON）
    #[arg(short, long)]
    pub project: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export() {
        let cli = Cli::parse_from([
            "zdxf", "export", "--project", "p.json", "--output", "out/plan", "--layer", "parcels",
            "--layer", "roads", "--scale", "1000",
        ]);

        assert_eq!(cli.log_level, "info");
        assert!(cli.config.is_none());
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.project, PathBuf::from("p.json"));
                assert_eq!(args.layers, ["parcels", "roads"]);
                assert_eq!(args.scale, Some(1000));
                assert!(args.crs.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_options() {
        let cli = Cli::parse_from([
            "zdxf", "--config", "custom.toml", "--log-level", "debug", "layers", "-p", "p.json",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Commands::Layers(_)));
    }

    #[test]
    fn test_parse_normalize() {
        let cli = Cli::parse_from(["zdxf", "normalize", "in.dxf", "--units", "mm"]);

        match cli.command {
            Commands::Normalize(args) => {
                assert_eq!(args.input, PathBuf::from("in.dxf"));
                assert!(args.output.is_none());
                assert_eq!(args.units.as_deref(), Some("mm"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_export_requires_project() {
        assert!(Cli::try_parse_from(["zdxf", "export", "--output", "plan"]).is_err());
    }
}

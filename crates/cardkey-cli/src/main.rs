//! Cardkey 智能卡身份命令行工具

mod commands;
mod error;
mod logging;
mod settings;

use std::path::PathBuf;

use cardkey_crypto::Algorithm;
use cardkey_token::{Capability, KeyOperation};
use clap::{Parser, Subcommand};
use commands::{issue::IssueArgs, operate::OperateArgs, Session};
use error::CliResult;
use settings::Settings;

#[derive(Parser)]
#[command(name = "cardkey")]
#[command(about = "Cardkey 智能卡身份工具 - 查询身份、签名验证、加密解密和客户端认证")]
#[command(version)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, global = true, default_value = "config/cardkey.toml")]
    config: PathBuf,

    /// 身份仓库目录（覆盖配置）
    #[arg(short, long, global = true)]
    depot: Option<PathBuf>,

    /// 模拟令牌提供方未运行
    #[arg(long, global = true)]
    suspended: bool,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出令牌中的身份
    List {
        /// 按能力过滤 (signing, decryption, authentication, all)
        #[arg(long, value_parser = parse_capability)]
        capability: Option<Capability>,

        /// 以JSON输出证书信息
        #[arg(long)]
        json: bool,
    },

    /// 签名并验证消息
    Sign {
        /// 消息内容
        #[arg(short, long)]
        message: String,

        /// 选择的身份序号，可重复
        #[arg(short, long)]
        select: Vec<usize>,

        /// 签名算法
        #[arg(short, long, value_parser = parse_algorithm)]
        algorithm: Option<Algorithm>,

        #[arg(long)]
        json: bool,
    },

    /// 加密并解密消息
    Encrypt {
        /// 消息内容
        #[arg(short, long)]
        message: String,

        /// 选择的身份序号，可重复
        #[arg(short, long)]
        select: Vec<usize>,

        /// 加密算法
        #[arg(short, long, value_parser = parse_algorithm)]
        algorithm: Option<Algorithm>,

        #[arg(long)]
        json: bool,
    },

    /// 使用客户端证书应答认证质询
    Auth {
        /// 选择的身份序号（只能一个）
        #[arg(short, long)]
        select: Vec<usize>,

        /// 请求地址（覆盖配置）
        #[arg(short, long)]
        url: Option<String>,
    },

    /// 创建测试CA并签发客户端身份
    Issue {
        /// 客户端名称或邮箱
        #[arg(required = true)]
        clients: Vec<String>,

        /// 输出目录（默认为身份仓库目录）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 证书用途说明，例如 "AuthEncryptSign" 或 "a,es"
        #[arg(short, long)]
        purposes: Option<String>,

        /// 每张证书的副本数
        #[arg(long)]
        copies: Option<u32>,
    },

    /// 解析证书用途说明
    Purposes {
        specifier: String,

        #[arg(long)]
        json: bool,
    },
}

fn parse_algorithm(value: &str) -> Result<Algorithm, String> {
    value.parse::<Algorithm>().map_err(|e| e.to_string())
}

fn parse_capability(value: &str) -> Result<Capability, String> {
    match value.to_lowercase().as_str() {
        "signing" | "sign" => Ok(Capability::Signing),
        "decryption" | "decrypt" => Ok(Capability::Decryption),
        "authentication" | "auth" => Ok(Capability::Authentication),
        "all" => Ok(Capability::All),
        other => Err(format!("unknown capability: {other}")),
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;
    logging::init(&settings.log.level, cli.verbose);

    match cli.command {
        Commands::List { capability, json } => {
            let session = Session::open(settings, cli.depot, cli.suspended)?;
            commands::list::handle(&session, capability, json)?;
        }
        Commands::Sign {
            message,
            select,
            algorithm,
            json,
        } => {
            let session = Session::open(settings, cli.depot, cli.suspended)?;
            let args = OperateArgs {
                message,
                select,
                algorithm,
                json,
            };
            commands::operate::handle(&session, KeyOperation::SignAndVerify, args)?;
        }
        Commands::Encrypt {
            message,
            select,
            algorithm,
            json,
        } => {
            let session = Session::open(settings, cli.depot, cli.suspended)?;
            let args = OperateArgs {
                message,
                select,
                algorithm,
                json,
            };
            commands::operate::handle(&session, KeyOperation::EncryptAndDecrypt, args)?;
        }
        Commands::Auth { select, url } => {
            let session = Session::open(settings, cli.depot, cli.suspended)?;
            commands::auth::handle(&session, &select, url)?;
        }
        Commands::Issue {
            clients,
            output,
            purposes,
            copies,
        } => {
            let output = output
                .or(cli.depot)
                .unwrap_or_else(|| settings.depot.path.clone());
            let args = IssueArgs {
                clients,
                output,
                purposes,
                copies,
            };
            commands::issue::handle(settings.authority, args)?;
        }
        Commands::Purposes { specifier, json } => {
            commands::purposes::handle(&specifier, json)?;
        }
    }

    Ok(())
}

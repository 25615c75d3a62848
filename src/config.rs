use crate::models::ModelDescriptor;
use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件目录
    pub models_dir: PathBuf,

    /// 工作线程数量
    pub workers: usize,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 启用图优化
    pub enable_optimization: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,

    /// 单张图片最大字节数
    pub max_image_size: usize,
}

impl Config {
    pub fn new(
        bind_addr: String,
        models_dir: String,
        workers: Option<usize>,
        intra_threads: Option<usize>,
        dev_mode: bool,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);

        if workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }

        let onnx_config = OnnxConfig {
            intra_threads: intra_threads.unwrap_or((cpu_cores * 3 / 4).max(1)), // 默认75%的CPU核心
            enable_optimization: true,
        };

        // base64编码会膨胀约1/3，请求体上限留出余量
        let max_image_size = 20 * 1024 * 1024;
        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size: max_image_size * 3 / 2,
            max_image_size,
        };

        Ok(Self {
            bind_addr,
            models_dir: PathBuf::from(models_dir),
            workers,
            dev_mode,
            onnx_config,
            server_config,
        })
    }

    /// 获取全部模型描述（固定目录表）
    pub fn model_descriptors(&self) -> Vec<ModelDescriptor> {
        ModelDescriptor::catalog(&self.models_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5006".to_string(),
            models_dir: PathBuf::from("models"),
            workers: 1,
            dev_mode: false,
            onnx_config: OnnxConfig {
                intra_threads: 1,
                enable_optimization: true,
            },
            server_config: ServerConfig {
                request_timeout: 60,
                max_request_size: 30 * 1024 * 1024,
                max_image_size: 20 * 1024 * 1024,
            },
        }
    }
}

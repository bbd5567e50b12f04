use anyhow::Result;
use quiz_forge::utils::logging;
use quiz_forge::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：指定了 QUIZ_CONFIG 时读取 TOML 文件，否则只读环境变量
    let config = match std::env::var("QUIZ_CONFIG") {
        Ok(path) => Config::from_toml_file(&path)?,
        Err(_) => Config::from_env(),
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}

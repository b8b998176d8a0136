use anyhow::Result;
use chatify_push_loadtest::ApplicationBootstrap;

#[tokio::main]
async fn main() -> Result<()> {
    // 第一个参数为配置路径（文件或目录），默认 config
    let config_path = std::env::args().nth(1);

    ApplicationBootstrap::run(config_path.as_deref()).await?;
    Ok(())
}

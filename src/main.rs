use anyhow::Result;
use question_solve_transfer::utils::logging;
use question_solve_transfer::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::load();

    // 初始化并运行流水线
    App::initialize(config).await?.run().await?;

    Ok(())
}

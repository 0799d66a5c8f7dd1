//! `risk db status` and `risk db migrate`.

use anyhow::Result;

pub async fn status() -> Result<()> {
    let pool = risk_db::connect_from_env().await?;
    let s = risk_db::status(&pool).await?;
    println!("db_ok={} has_run_table={}", s.ok, s.has_run_table);
    Ok(())
}

pub async fn migrate() -> Result<()> {
    let pool = risk_db::connect_from_env().await?;
    risk_db::migrate(&pool).await?;
    println!("migrations_applied=true");
    Ok(())
}

//! 衍生路徑示例

use derived::{derived_property, DerivedConfig, Object, Value};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    println!("=== 衍生路徑示例 ===\n");

    // 創建頁面物件
    let page = Object::from_json(serde_json::json!({
        "name": "home",
        "ext": ".hbs",
        "dirname": "views"
    }))
    .ok_or("頁面必須是 JSON 物件")?;

    // 只監看 dirname
    let path = derived_property(
        DerivedConfig::new()
            .with_dependencies(["dirname"])
            .with_getter(|this, args| {
                Value::from(format!("{}/{}{}", args[0], this.get("name"), this.get("ext")))
            }),
    )?;
    page.define_property("path", path)?;

    println!("初始路徑: {}", page.get("path"));

    page.set("ext", ".html")?;
    println!("修改 ext 後（非依賴，沿用快取）: {}", page.get("path"));

    page.set("dirname", "_gh_pages")?;
    println!("修改 dirname 後: {}", page.get("path"));

    if let Err(err) = page.set("path", "elsewhere") {
        println!("\n寫入衍生屬性失敗: {}", err);
    }

    Ok(())
}

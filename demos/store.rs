//! Demonstration of a Store holding editor settings

use propbag::{Store, Value};

fn main() {
    println!("=== Store Example: Editor Settings ===\n");

    // Create store with defaults
    let settings: Store = Store::new([
        ("theme", Value::from("light")),
        ("font_size", Value::from(12)),
        ("word_wrap", Value::from(false)),
    ]);

    println!("1. Setting up listeners");
    let _any = settings.on_change(|keys| {
        println!("   [Store Update] changed: {:?}", keys);
    });
    let _theme = settings.on_key_change("theme", |new, old| {
        let show = |v: Option<&Value>| v.map_or_else(|| "<unset>".to_string(), Value::to_string);
        println!("   [theme] {} -> {}", show(old), show(new));
    });

    println!("\n2. Switching theme");
    settings.set("theme", "dark");

    println!("\n3. Setting the same theme again (no events)");
    settings.set("theme", "dark");

    println!("\n4. Changing several settings at once");
    settings.set_properties([("font_size", Value::from(14)), ("word_wrap", Value::from(true))]);

    println!("\n5. Current settings:");
    settings.for_each(|key, value| {
        println!("   {} = {}", key, value);
    });

    println!("\n6. Replacing everything");
    settings.set_all([("theme", Value::from("solarized"))]);

    println!("\n7. Resetting to defaults");
    settings.reset();

    println!("\n8. Final settings:");
    settings.for_each(|key, value| {
        println!("   {} = {}", key, value);
    });

    println!("\n✓ Example complete!");
}

use std::time::Duration;

use qframe::transport::ScriptedEngine;
use qframe::*;
use tracing_subscriber::EnvFilter;

fn trades() -> WireValue {
    WireValue::table([
        ("ticker", WireValue::symbols(["GOOG", "MSFT", "AAPL"])),
        ("price", WireValue::longs([20, 30, 40])),
        ("size", WireValue::longs([10, 20, 30])),
    ])
}

fn print_shape(label: &str, shape: &ResultShape) {
    println!("{label}:");
    for row in shape.clone().into_rows() {
        let cells: Vec<String> = row.iter().map(|c| registry().format(c.as_ref())).collect();
        println!("  {}", cells.join(" | "));
    }
    println!();
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("qframe demo against a scripted engine\n");

    // Answers for the queries the demo sends
    let engine = ScriptedEngine::new();
    engine
        .on_exact("count trades", WireValue::long(3))
        .on_exact(
            "select c, t from 0!meta `trades",
            WireValue::table([
                ("c", WireValue::symbols(["ticker", "price", "size"])),
                ("t", WireValue::chars("sjj")),
            ]),
        )
        .on_exact("(count trades;count cols trades)", WireValue::longs([3, 3]))
        .on_exact("(0!trades)[til count trades;cols trades]", trades())
        .on_exact(
            "(0!trades)[(1);`ticker`price]",
            WireValue::List(vec![
                WireValue::atom(TypedValue::symbol("MSFT")),
                WireValue::long(30),
            ]),
        )
        .on_prefix("(0!select from", trades())
        .on_prefix("(cols ", WireValue::symbols(["bid"]))
        .on_exact("r", trades());

    let config = ClientConfig::default();
    let client = Client::connect(config, engine.connector())?;

    let (rows, columns) = client.shape("trades")?;
    println!("trades has {rows} rows and {columns} columns\n");

    print_shape("iloc everything", &client.iloc("trades", &[], &[])?);
    print_shape("iloc row 1, columns 0 and 1", &client.iloc("trades", &[1], &[0, 1])?);

    match client.iloc("trades", &[7], &[]) {
        Err(e) => println!("out of range: {e}\n"),
        Ok(shape) => print_shape("unexpected", &shape),
    }

    print_shape("loc price > 20, size < 30", &client.loc("trades", "price > 20, size < 30")?);

    client.inner_join("trades", "quotes", "r", &["ticker"])?;
    client.window_join(
        "trades",
        "quotes",
        "r",
        &["ticker"],
        ("time", "time"),
        Duration::from_secs(1),
    )?;

    println!("queries sent:");
    for query in engine.submitted() {
        println!("  {query}");
    }

    client.connection().disconnect();
    Ok(())
}

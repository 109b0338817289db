use anyhow::{Context, Result};
use rand::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;

/// One row of the synthetic `sales.csv`, field names as in the real dataset.
#[derive(Serialize)]
struct SaleRow {
    #[serde(rename = "Car_Name")]
    car_name: String,
    #[serde(rename = "Year")]
    year: i64,
    #[serde(rename = "Selling_Price")]
    selling_price: f64,
    #[serde(rename = "Present_Price")]
    present_price: f64,
    #[serde(rename = "Driven_kms")]
    driven_kms: u64,
    #[serde(rename = "Fuel_Type")]
    fuel_type: &'static str,
    #[serde(rename = "Selling_type")]
    selling_type: &'static str,
    #[serde(rename = "Transmission")]
    transmission: &'static str,
    #[serde(rename = "Owner")]
    owner: u8,
}

/// (compound name, new price in lakhs)
const MODELS: [(&str, f64); 12] = [
    ("maruti ritz", 5.6),
    ("maruti swift", 6.9),
    ("maruti ciaz", 9.9),
    ("honda city", 10.0),
    ("honda amaze", 7.7),
    ("hyundai i20", 7.5),
    ("hyundai verna", 11.0),
    ("toyota corolla altis", 18.5),
    ("toyota innova", 20.0),
    ("toyota fortuner", 30.6),
    ("Royal Enfield Classic 350", 1.5),
    ("Bajaj Pulsar 150", 0.8),
];

fn gauss(rng: &mut Xoshiro256PlusPlus, mean: f64, std_dev: f64) -> f64 {
    // Box-Muller
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    mean + std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn main() -> Result<()> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
    let output_path = "sales.csv";
    let mut writer = csv::Writer::from_path(output_path).context("creating sales.csv")?;

    let n_rows = 301;
    for _ in 0..n_rows {
        let &(name, base_price) = MODELS.choose(&mut rng).context("empty model list")?;
        let year = rng.gen_range(2003..=2018);
        let age = (2025 - year) as f64;

        let present_price = (base_price * gauss(&mut rng, 1.0, 0.08)).max(0.3);
        let driven_kms = (age * gauss(&mut rng, 9000.0, 3000.0)).max(500.0) as u64;

        let fuel_type = match rng.gen_range(0..100) {
            0..=2 => "CNG",
            3..=22 => "Diesel",
            _ => "Petrol",
        };
        let two_wheeler = base_price < 2.0;
        let selling_type = if two_wheeler || rng.gen_bool(0.1) { "Individual" } else { "Dealer" };
        let transmission = if rng.gen_bool(0.13) { "Automatic" } else { "Manual" };
        let owner = match rng.gen_range(0..100) {
            0..=95 => 0,
            96..=98 => 1,
            _ => 3,
        };

        let mut price = present_price * 0.88f64.powf(age - 5.0).min(1.0) * 0.7;
        if fuel_type == "Diesel" {
            price *= 1.15;
        }
        if transmission == "Automatic" {
            price *= 1.1;
        }
        price *= 1.0 - 0.05 * owner as f64;
        price -= driven_kms as f64 / 1_000_000.0;
        let selling_price = (price * gauss(&mut rng, 1.0, 0.05)).max(0.1);

        writer.serialize(SaleRow {
            car_name: name.to_string(),
            year,
            selling_price: (selling_price * 100.0).round() / 100.0,
            present_price: (present_price * 100.0).round() / 100.0,
            driven_kms,
            fuel_type,
            selling_type,
            transmission,
            owner,
        })?;
    }
    writer.flush()?;

    println!("Wrote {n_rows} listings to {output_path}");
    Ok(())
}

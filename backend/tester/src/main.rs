use std::collections::HashSet;

use anyhow::{Context, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::task::JoinSet;

/// Fires a concurrent batch of recipe creates and checks the returned
/// sequence numbers. Assumes nobody else is creating recipes meanwhile.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    url: String,

    #[arg(long, default_value_t = 50)]
    count: usize,
}

#[derive(Deserialize)]
struct Created {
    seq: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let client = Client::new();
    let endpoint = format!("{}/api/v1/recipes/viewer", args.url.trim_end_matches('/'));

    let pb = ProgressBar::new(args.count as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let mut set = JoinSet::new();
    for i in 0..args.count {
        let client = client.clone();
        let endpoint = endpoint.clone();

        set.spawn(async move {
            let body = json!({
                "title": format!("Load test {i}"),
                "ingredients": ["Salt"],
                "steps": ["Taste"],
                "chefName": "tester",
            });

            let created: Created = client
                .post(&endpoint)
                .json(&body)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            anyhow::Ok(created.seq)
        });
    }

    let mut seqs = Vec::with_capacity(args.count);
    while let Some(result) = set.join_next().await {
        seqs.push(result.context("create task panicked")??);
        pb.inc(1);
    }
    pb.finish_with_message("Done");

    let (first, last) = check_batch(&mut seqs)?;
    println!("\n{} recipes created, sequences {first}..={last}", seqs.len());

    Ok(())
}

/// Sorts `seqs` and checks they are unique and contiguous.
fn check_batch(seqs: &mut [i64]) -> anyhow::Result<(i64, i64)> {
    seqs.sort_unstable();

    let (Some(&first), Some(&last)) = (seqs.first(), seqs.last()) else {
        bail!("no recipes were created");
    };

    let unique: HashSet<i64> = seqs.iter().copied().collect();
    if unique.len() != seqs.len() {
        bail!(
            "duplicate sequence numbers: {} issued, {} unique",
            seqs.len(),
            unique.len()
        );
    }

    if last - first + 1 != seqs.len() as i64 {
        bail!("gap in sequence numbers between {first} and {last}");
    }

    Ok((first, last))
}

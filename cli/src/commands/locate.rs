use std::time::Instant;

use anyhow::Context;
use portfind_common::hosts::HostOverrides;
use portfind_common::models::ResultRow;
use portfind_common::network::target::Query;
use portfind_common::network::vendor::MacOuiRepo;
use portfind_core::api::dashboard::HttpDashboard;
use portfind_core::locator::Locator;
use portfind_core::resolver::{DnsReverseLookup, HostnameLookup, NoLookup};
use portfind_core::scope;
use tracing::debug;

use crate::commands::GlobalArgs;
use crate::terminal::{format, print};

/// Runs one query and prints the rows. Also backs the `table` subcommand
/// through [`Query::full_table`].
pub async fn locate(query: Query, args: &GlobalArgs) -> anyhow::Result<()> {
    let config = args.to_config()?;
    let overrides = match &args.hosts_file {
        Some(path) => HostOverrides::load(path)
            .with_context(|| format!("could not load {}", path.display()))?,
        None => HostOverrides::empty(),
    };

    let api = HttpDashboard::new(&config)?;
    let dns: Box<dyn HostnameLookup> = if config.no_dns {
        Box::new(NoLookup)
    } else {
        Box::new(DnsReverseLookup::from_config(&config))
    };

    let scope = scope::resolve_scope(&api, args.org.as_deref(), &args.network).await?;
    debug!(
        "Searching {} network(s) in {} for {query}",
        scope.networks.len(),
        scope.org.name
    );

    if !args.json {
        print::header(&format!("locating {query}"));
    }

    let start = Instant::now();
    let locator = Locator::new(&api, dns.as_ref(), &overrides, &config);
    let rows = locator.resolve(&query, &scope).await?;
    let elapsed = start.elapsed();

    if args.json {
        println!("{}", format::rows_to_json(&rows)?);
        return Ok(());
    }

    print_summary(&rows, scope.networks.len(), elapsed.as_secs_f64());
    Ok(())
}

fn print_summary(rows: &[ResultRow], networks: usize, secs: f64) {
    if rows.is_empty() {
        print::no_results("matches");
        return;
    }
    format::print_rows(rows, &MacOuiRepo);
    print::fat_separator();
    print::print_status(format!(
        "{} row(s) across {} network(s) in {:.2}s",
        rows.len(),
        networks,
        secs
    ));
}

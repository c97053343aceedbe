use colored::*;
use portfind_common::models::Organization;
use portfind_core::api::DashboardApi;
use portfind_core::api::dashboard::HttpDashboard;
use portfind_core::scope;

use crate::commands::GlobalArgs;
use crate::terminal::{colors, print};

pub async fn orgs(args: &GlobalArgs) -> anyhow::Result<()> {
    let config = args.to_config()?;
    let api = HttpDashboard::new(&config)?;
    let orgs = api.organizations().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&orgs)?);
        return Ok(());
    }

    print::header("organizations");
    for (idx, org) in orgs.iter().enumerate() {
        print::tree_head(idx, &org.name);
        print::as_tree_one_level(vec![("ID".to_string(), org.id.color(colors::ACCENT))]);
    }
    Ok(())
}

/// Networks of `--org`, or of every organization when none is given.
pub async fn networks(args: &GlobalArgs) -> anyhow::Result<()> {
    let config = args.to_config()?;
    let api = HttpDashboard::new(&config)?;
    let all = api.organizations().await?;

    let selected: Vec<Organization> = match args.org.as_deref() {
        Some(name) => vec![scope::select_organization(Some(name), &all)?],
        None => all,
    };

    let mut listing = Vec::with_capacity(selected.len());
    for org in selected {
        let networks = api.networks(&org.id).await?;
        listing.push((org, networks));
    }

    if args.json {
        let networks: Vec<_> = listing.iter().flat_map(|(_, nets)| nets).collect();
        println!("{}", serde_json::to_string_pretty(&networks)?);
        return Ok(());
    }

    for (org, networks) in &listing {
        print::header(&org.name);
        for (idx, network) in networks.iter().enumerate() {
            print::tree_head(idx, &network.name);
            print::as_tree_one_level(vec![(
                "ID".to_string(),
                network.id.color(colors::ACCENT),
            )]);
        }
    }
    Ok(())
}

pub async fn check(args: &GlobalArgs) -> anyhow::Result<()> {
    let config = args.to_config()?;
    let api = HttpDashboard::new(&config)?;
    let orgs = api.organizations().await?;
    print::print_status(format!(
        "API key accepted, {} organization(s) visible",
        orgs.len()
    ));
    Ok(())
}

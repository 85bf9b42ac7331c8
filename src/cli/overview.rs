use chrono::Local;
use clap::Parser;

use crate::{
    cli::{EsitArgs, QueryArgs},
    ops,
    prelude::*,
    tables,
};

#[derive(Parser)]
pub struct OverviewArgs {
    #[clap(flatten)]
    pub esit: EsitArgs,

    #[clap(flatten)]
    pub query: QueryArgs,
}

impl OverviewArgs {
    pub async fn run(self) -> Result {
        let api = self.esit.connect()?;
        let now = ops::effective_now(Local::now(), self.query.query_year);
        let mut cache = self.query.read_cache();

        let snapshots =
            ops::fetch_snapshots(&api, self.query.tariff_types(), now, &mut cache).await?;
        self.query.write_cache(&cache);

        let component = self.query.component.as_deref();
        for snapshot in &snapshots {
            println!("{}", tables::build_overview_table(snapshot, now, component));
            println!("{}", tables::build_membership_table(snapshot, now, component));
        }
        Ok(())
    }
}

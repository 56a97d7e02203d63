use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = savor_worker::Args::parse();

	savor_worker::run(args).await
}

use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;
use clap::Parser;
use fake_user_agent::get_chrome_rua;
use iori_mpd::{
    convert, extract_tracks, fetch::load_manifest, ConvertOptions, FixedPrompt, HttpClient,
    TerminalPrompt,
};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    ClientBuilder,
};
use url::Url;

#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Mpd2M3u8Args {
    /// Debug output
    #[clap(short, long, alias = "debug", env = "MPD2M3U8_VERBOSE")]
    verbose: bool,

    /// Directory to write the playlists to. Created if missing.
    #[clap(short, long, default_value = ".", env = "MPD2M3U8_OUTPUT")]
    output: PathBuf,

    /// Base URL for relative BaseURLs, replacing the manifest location
    #[clap(long, env = "MPD2M3U8_BASE_URL")]
    base_url: Option<String>,

    /// HTTP Header used to fetch the manifest
    ///
    /// Custom header. eg. "User-Agent: xxxxx". This option will override --cookies.
    #[clap(short = 'H', long = "header", env = "MPD2M3U8_HEADER", value_delimiter = '\n')]
    headers: Vec<String>,

    /// Cookies used to fetch the manifest
    #[clap(long, env = "MPD2M3U8_COOKIES")]
    cookies: Option<String>,

    /// Request timeout in seconds
    #[clap(short, long, default_value = "10", env = "MPD2M3U8_TIMEOUT")]
    timeout: u64,

    /// Retry limit for fetching the manifest
    #[clap(
        long,
        default_value = "3",
        env = "MPD2M3U8_MANIFEST_RETRIES",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    manifest_retries: u32,

    /// Track indices to keep when multiple audio languages are found, eg. "0 3".
    ///
    /// Skips the interactive prompt.
    #[clap(long, env = "MPD2M3U8_SELECT")]
    select: Option<String>,

    /// Fail on template identifiers without a value instead of keeping them in the url
    #[clap(long, env = "MPD2M3U8_STRICT")]
    strict: bool,

    /// Print the extracted tracks as json and exit
    #[clap(long, env = "MPD2M3U8_LIST")]
    list: bool,

    /// Manifest url or local path
    manifest: String,
}

impl Mpd2M3u8Args {
    fn client(&self, url: &Url) -> anyhow::Result<HttpClient> {
        let mut headers = HeaderMap::new();
        for header in &self.headers {
            let (key, value) = header
                .split_once(':')
                .with_context(|| format!("Invalid header: {header}"))?;
            headers.insert(
                HeaderName::from_str(key.trim()).context("Invalid header name")?,
                HeaderValue::from_str(value.trim()).context("Invalid header value")?,
            );
        }

        let builder = ClientBuilder::new()
            .default_headers(headers)
            .user_agent(get_chrome_rua())
            .timeout(Duration::from_secs(self.timeout));
        let client = HttpClient::new(builder)?;

        if let Some(cookies) = &self.cookies {
            let cookies = cookies
                .split(';')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
            client.add_cookies(cookies, url.clone())?;
        }
        Ok(client)
    }

    fn is_remote(&self) -> bool {
        self.manifest.starts_with("http://") || self.manifest.starts_with("https://")
    }

    /// Returns the manifest location used to resolve relative urls, and its text.
    async fn load(&self) -> anyhow::Result<(String, String)> {
        if self.is_remote() {
            let url = Url::parse(&self.manifest)?;
            let client = self.client(&url)?;
            let (url, text) = load_manifest(&client, url, self.manifest_retries).await?;
            Ok((url.to_string(), text))
        } else {
            let path = std::path::absolute(&self.manifest)?;
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok((path.to_string_lossy().into_owned(), text))
        }
    }

    fn convert_options(&self, manifest_url: String) -> ConvertOptions {
        ConvertOptions {
            manifest_url,
            base_url: self.base_url.clone(),
            output_dir: self.output.clone(),
            strict_templates: self.strict,
            created_by: format!("mpd2m3u8 {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Mpd2M3u8Args::parse();

    pretty_env_logger::formatted_builder()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();

    let (manifest_url, text) = args.load().await?;
    let options = args.convert_options(manifest_url);

    if args.list {
        let tracks = extract_tracks(&text, &options)?;
        println!("{}", serde_json::to_string_pretty(&tracks)?);
        return Ok(());
    }

    let entry = match &args.select {
        Some(answer) => convert(&text, &options, &mut FixedPrompt::new(Some(answer.clone())))?,
        None => convert(&text, &options, &mut TerminalPrompt::stdio())?,
    };
    println!("{}", entry.display());

    Ok(())
}

//! Scan command - recognize a hall from a photo

use crate::cli::error::HelpfulError;
use crate::cli::info::render_info;
use crate::cli::navigate::{self, NavigateArgs};
use hallnav::recognition::{NOT_RECOGNIZED_MESSAGE, RECOGNIZED_MESSAGE};
use hallnav::{AppConfig, HallDirectory, HomePage, ImagePayload, InfoPage, RecognitionClient, Transition};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ScanArgs {
    pub image: PathBuf,
    pub json: bool,
    pub navigate: bool,
}

pub async fn run(args: ScanArgs, config: &AppConfig) -> anyhow::Result<()> {
    if !args.image.exists() {
        return Err(HelpfulError::image_not_found(&args.image).into());
    }
    let payload = ImagePayload::from_file(&args.image).await.map_err(|e| {
        HelpfulError::new(e.to_string())
            .with_suggestion("TRY: Use a .jpg or .png photo of the hall entrance")
    })?;

    let client = Arc::new(RecognitionClient::new(
        &config.api.base_url,
        config.recognition_timeout(),
    )?);
    let endpoint = client.endpoint().clone();
    let mut home = HomePage::new(client);
    home.select_image(payload);

    let state = match home.scan().await {
        Transition::ToInfo(state) => state,
        _ => {
            let message = home.notice().unwrap_or(NOT_RECOGNIZED_MESSAGE).to_string();
            let mut err = HelpfulError::new(message);
            if home.is_offline() {
                err = err
                    .with_context(format!("Could not reach {}", endpoint))
                    .with_suggestions([
                        "TRY: Check your network connection".to_string(),
                        "TRY: hallnav config   # Check api.base_url".to_string(),
                    ]);
            } else {
                err = err.with_suggestion("TRY: Retake the photo with the hall sign in view");
            }
            return Err(err.into());
        }
    };

    if !args.json {
        println!("{}", RECOGNIZED_MESSAGE);
    }
    let directory = HallDirectory::new(config.open_store()?);
    let page = InfoPage::open(Some(state), &directory).await;
    render_info(&page, args.json, true)?;

    if args.navigate {
        if let Transition::ToNavigate(next) = page.navigate() {
            let nav = NavigateArgs {
                hall: next.hall,
                json: args.json,
                ..Default::default()
            };
            navigate::run(nav, config).await?;
        }
    }

    Ok(())
}

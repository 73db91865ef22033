use std::path::PathBuf;

use clap::{Parser, Subcommand};
use comfy_table::{presets, Attribute, Cell, Table};
use miette::{IntoDiagnostic, Result};
use ytsub::metadata::{fallback_file_name, TitleError};
use ytsub::{resolve_video_reference, Format, Kind, Subtitler};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let mut subtitler = Subtitler::new(&args.config).await?;

    match args.command {
        Command::Get(Get {
            url,
            kind,
            format,
            language,
            output,
            stdout,
        }) => {
            let format = match format {
                Some(f) => f.parse::<Format>()?,
                None => subtitler.options().format,
            };
            let video = resolve_video_reference(&url)?;

            if let Some(language) = language {
                subtitler.options_mut().language = language;
            }
            let kind = kind.unwrap_or(subtitler.options().kind);

            let file = ytsub::job::go(&subtitler, &video, kind, format).await?;

            if stdout {
                print!("{}", file.content);
            } else {
                let dir = output
                    .or_else(|| subtitler.options().output_dir.clone())
                    .unwrap_or_else(|| PathBuf::from("."));
                let path = file.save(dir).await?;
                println!("{}", path.display());
            }
        }
        Command::Tracks(Tracks { url }) => {
            let video = resolve_video_reference(&url)?;
            let tracks = subtitler.tracks(&video).await?;

            let mut table = Table::new();

            table.load_preset(presets::NOTHING);
            table.set_header(vec![
                Cell::new("Kind").add_attribute(Attribute::Bold),
                Cell::new("Language").add_attribute(Attribute::Bold),
                Cell::new("Name").add_attribute(Attribute::Bold),
            ]);

            for track in tracks {
                table.add_row(vec![
                    track.kind.to_string(),
                    track.language_code,
                    track.name.unwrap_or_default(),
                ]);
            }

            println!("{table}");
        }
        Command::Title(Title { url }) => {
            let video = resolve_video_reference(&url)?;

            match subtitler.fetch_title(&video).await {
                Ok(title) => println!("{title}"),
                Err(TitleError::TitleNotFound) => {
                    eprintln!("Title not found, subtitles would be saved as:");
                    println!("{}", fallback_file_name(&video, subtitler.options().format));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Id(Id { url }) => {
            println!("{}", resolve_video_reference(&url)?);
        }
        Command::Convert(Convert { file, format }) => {
            let raw = tokio::fs::read_to_string(&file).await.into_diagnostic()?;
            let format = format.unwrap_or_else(|| subtitler.options().format.to_string());

            print!("{}", ytsub::convert(&raw, &format)?);
        }
    }

    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Custom location of configuration file.
    #[arg(short, long, id = "FILE")]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
struct Get {
    /// URL of the video.
    url: String,

    /// Kind of captions: auto or manual.
    #[arg(short, long)]
    kind: Option<Kind>,

    /// Output format: vtt, srt or txt.
    #[arg(short, long)]
    format: Option<String>,

    /// Language code of the captions.
    #[arg(short, long)]
    language: Option<String>,

    /// Directory to save the subtitles into.
    #[arg(short, long, id = "DIR")]
    output: Option<PathBuf>,

    /// Print subtitles instead of saving them.
    #[arg(long, conflicts_with = "DIR")]
    stdout: bool,
}

#[derive(Parser, Debug)]
struct Tracks {
    /// URL of the video.
    url: String,
}

#[derive(Parser, Debug)]
struct Title {
    /// URL of the video.
    url: String,
}

#[derive(Parser, Debug)]
struct Id {
    /// URL of the video.
    url: String,
}

#[derive(Parser, Debug)]
struct Convert {
    /// File with downloaded timed-text payload.
    file: PathBuf,

    /// Output format: vtt, srt or txt.
    #[arg(short, long)]
    format: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download subtitles of a video.
    Get(Get),
    /// List caption tracks of a video.
    Tracks(Tracks),
    /// Show title of a video.
    Title(Title),
    /// Show identifier of a video.
    Id(Id),
    /// Convert a saved caption track.
    Convert(Convert),
}

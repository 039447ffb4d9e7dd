use std::{process::ExitCode, sync::Arc};

use futures::future::join_all;
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use petfeed::{
    api::{FeedApi, GatewayClient},
    comment::CommentController,
    config::{Command, Config},
    display::{display_animals, display_comments, display_feed, display_user},
    error::{Error, Result},
    feed::FeedController,
    form::{AdoptionForm, ProfileForm, PublicationDraft, RegisterForm, Upload},
    model::LikeState,
    session::Session,
    viewer::MediaViewer,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    config.init_logger();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Validation(fields)) => {
            for (field, message) in fields.iter() {
                error!("{}: {}", field, message);
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<()> {
    let session = config.session()?;
    let gateway = Arc::new(GatewayClient::new(&config, session.clone()));
    let api: Arc<dyn FeedApi> = gateway.clone();
    let feed = FeedController::new(api.clone(), session.clone())
        .with_settle_delay(config.settle_delay())
        .with_cache(config.cache());

    match config.command.clone() {
        Command::Feed { comments } => {
            info!("Loading feed");
            let total = feed.refetch().await?;
            info!("{} publications", total);
            info!("");
            if comments {
                let lists = join_all(feed.publications().into_iter().map(|publication| {
                    let api = api.clone();
                    let session = session.clone();
                    async move {
                        let mut comments = CommentController::new(api, session, &publication.id);
                        comments.load().await?;
                        Ok::<_, Error>(comments)
                    }
                }))
                .await;
                for comments in lists {
                    let comments = comments?;
                    feed.set_comment_count(comments.publication_id(), comments.count());
                }
            }
            display_feed(&feed.publications(), session.user_id().as_deref());
        }
        Command::Like { publication } => {
            feed.refetch().await?;
            match feed.toggle_like(&publication).await? {
                LikeState::Liked => info!("Liked {}", publication),
                LikeState::NotLiked => info!("Unliked {}", publication),
            }
            if let Some(publication) = feed.get(&publication) {
                info!("{} likes", publication.likes.count);
            }
        }
        Command::Media { publication, start } => {
            feed.refetch().await?;
            let publication = feed
                .get(&publication)
                .ok_or_else(|| Error::NotFound(format!("publication {publication}")))?;
            browse_media(MediaViewer::open(publication.media, start)).await?;
        }
        Command::Comments { publication } => {
            let mut comments = CommentController::new(api, session, publication);
            display_comments(comments.load().await?);
        }
        Command::Comment { publication, text } => {
            let mut comments = CommentController::new(api, session, &publication)
                .on_count_change(|count| info!("{} comments now", count));
            comments.add(&text).await?;
            display_comments(comments.comments());
        }
        Command::Uncomment { publication, comment } => {
            let mut comments = CommentController::new(api, session, publication)
                .on_count_change(|count| info!("{} comments now", count));
            comments.load().await?;
            comments.delete(&comment).await?;
        }
        Command::Publish { text, files } => {
            let mut draft = PublicationDraft::new(text);
            let mut uploads = Vec::with_capacity(files.len());
            for path in files {
                uploads.push(Upload::read(path).await?);
            }
            draft.add_files(uploads)?;
            let created = feed.publish(draft).await?;
            display_feed(&[created], session.user_id().as_deref());
        }
        Command::Unpublish { publication } => {
            feed.refetch().await?;
            feed.delete_publication(&publication).await?;
        }
        Command::Animals(filter) => {
            let animals = gateway.list_animals(&filter.into()).await?;
            display_animals(&animals);
        }
        Command::RegisterAnimal(args) => {
            session.require_user()?;
            let photo = args.photo.clone();
            let mut form = args.into_form();
            if let Some(path) = photo {
                form.photo = Some(Upload::read(path).await?);
            }
            let animal = gateway.create_animal(form.build()?).await?;
            info!("Registered {} ({})", animal.name, animal.id);
        }
        Command::RemoveAnimal { animal } => {
            gateway.delete_animal(&animal).await?;
            info!("Removed animal {}", animal);
        }
        Command::Adopt(args) => {
            session.require_user()?;
            feed.refetch().await?;
            let publication = feed
                .get(&args.publication)
                .ok_or_else(|| Error::NotFound(format!("publication {}", args.publication)))?;
            let request = AdoptionForm::from(args).build(&publication)?;
            gateway.request_adoption(&request).await?;
            info!("Adoption request sent to {}", publication.author.name);
        }
        Command::Me => {
            session.require_user()?;
            display_user(&gateway.current_user().await?);
        }
        Command::UpdateMe(args) => {
            session.require_user()?;
            let profile = ProfileForm::from(args).build()?;
            display_user(&gateway.update_user(&profile).await?);
        }
        Command::Photo { path } => {
            session.require_user()?;
            let photo = Upload::read(path).await?.into_photo()?;
            let response = gateway.upload_profile_photo(photo).await?;
            info!("Profile photo: {}", response.profile_photo);
        }
        Command::Signup(args) => {
            session.require_user()?;
            let user = RegisterForm::from(args).build()?;
            let user = gateway.register(&user).await?;
            info!("Welcome, {}!", user.name);
        }
        Command::Login { token } => {
            let session = Session::load(config.token_store())?;
            let claims = session.login(&token)?;
            info!("Logged in as {}", claims.email.as_deref().unwrap_or(&claims.user_id));
        }
        Command::Logout => {
            Session::load(config.token_store())?.invalidate()?;
            info!("Logged out");
        }
    }
    Ok(())
}

/// Step through the photos with `n`, `p`, a photo number or `q`.
async fn browse_media(mut viewer: MediaViewer) -> Result<()> {
    if viewer.is_empty() {
        warn!("This publication has no media");
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if let Some(url) = viewer.current() {
            info!("[{}/{}] {}", viewer.index() + 1, viewer.len(), url);
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "q" | "quit" => break,
            "p" | "prev" => viewer.prev(),
            "" | "n" | "next" => viewer.next(),
            other => match other.parse::<usize>() {
                Ok(number) if number > 0 => viewer.go_to(number - 1),
                _ => warn!("Unknown input {:?}", other),
            },
        }
    }
    viewer.close();
    Ok(())
}

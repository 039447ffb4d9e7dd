use log::info;

use crate::model::{Animal, Comment, LikeState, Publication, User};

/// Render the feed as one card per publication.
pub fn display_feed(publications: &[Publication], user_id: Option<&str>) {
    if !log::log_enabled!(log::Level::Info) {
        return;
    }
    if publications.is_empty() {
        info!("No publications yet");
        info!("");
        return;
    }

    for publication in publications {
        let heart = match user_id.map(|user| LikeState::of(publication, user)) {
            Some(LikeState::Liked) => "♥",
            _ => "♡",
        };
        info!(
            "+- {} -- {} -- {} - -",
            publication.id,
            publication.author.name,
            publication.created_at.format("%d/%m/%Y %H:%M")
        );
        for line in publication.text.lines() {
            info!("| {}", line);
        }
        if !publication.media.is_empty() {
            info!("| [{} media]", publication.media.len());
        }
        info!(
            "+- {} {} -- {} comments -------- - -",
            heart, publication.likes.count, publication.comments
        );
        info!("");
    }
}

pub fn display_comments(comments: &[Comment]) {
    if log::log_enabled!(log::Level::Info) {
        let name_width = comments
            .iter()
            .map(|c| c.author_name.chars().count())
            .fold(6_usize, usize::max);

        for comment in comments {
            info!(
                "  {:name_width$} | {} ({})",
                comment.author_name, comment.text, comment.id
            );
        }
        info!("  {} comments", comments.len());
        info!("");
    }
}

pub fn display_animals(animals: &[Animal]) {
    if log::log_enabled!(log::Level::Info) {
        let (mut id_width, mut name_width) = (4_usize, 6_usize);
        for animal in animals {
            id_width = animal.id.len().max(id_width);
            name_width = animal.name.chars().count().max(name_width);
        }

        info!(
            "+-{:-<id_width$}-+-{:-<name_width$}-+-{}------- - -",
            " Id ", " Name ", " Details "
        );
        for animal in animals {
            info!(
                "| {:id_width$} | {:name_width$} | {} {}, {}y, {}, {}",
                animal.id, animal.name, animal.species, animal.breed, animal.age, animal.size,
                animal.location
            );
        }
        info!(
            "+-{}-+-{}-+------------ - -",
            "-".repeat(id_width),
            "-".repeat(name_width)
        );
        info!("{} animals", animals.len());
        info!("");
    }
}

pub fn display_user(user: &User) {
    info!("{} <{}>", user.name, user.email);
    let profile = &user.profile;
    let fields = [
        ("Full name", &profile.full_name),
        ("Birth date", &profile.birth_date),
        ("Gender", &profile.gender),
        ("Phone", &profile.phone),
        ("City", &profile.city),
        ("Neighbourhood", &profile.neighbourhood),
        ("State", &profile.state),
        ("Zip code", &profile.zip_code),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            info!(" + {}: {}", label, value);
        }
    }
    if let Some(photo) = &user.profile_photo {
        info!(" + Photo: {}", photo);
    }
}

//! Sample titles loaded into an empty catalog.

use crate::models::{Chapter, Manga, MangaKind, MangaStatus};
use chrono::NaiveDate;

const UNSPLASH: &str = "https://images.unsplash.com";

fn page(photo: &str) -> String {
    format!("{}/photo-{}?w=800&h=1200&fit=crop", UNSPLASH, photo)
}

fn chapter(id: &str, title: &str, release: (i32, u32, u32), photos: &[&str]) -> Chapter {
    Chapter {
        id: id.to_string(),
        chapter_number: id.to_string(),
        title: title.to_string(),
        release_date: NaiveDate::from_ymd_opt(release.0, release.1, release.2),
        pages: photos.iter().map(|p| page(p)).collect(),
    }
}

pub fn sample_catalog() -> Vec<Manga> {
    vec![
        Manga {
            id: "1".to_string(),
            title: "Garden of Words".to_string(),
            subtitle: Some("言の葉の庭".to_string()),
            author: "Makoto Shinkai".to_string(),
            artist: Some("CoMix Wave Films".to_string()),
            description: "On a rainy morning in Tokyo, an aspiring shoemaker skips class \
                to sketch in a garden and meets a mysterious woman."
                .to_string(),
            cover_image: Some(format!("{}/photo-1578632292335-df3abbb0d586?w=400&h=600&fit=crop", UNSPLASH)),
            banner_image: Some(format!("{}/photo-1578632292335-df3abbb0d586?w=1200&h=400&fit=crop", UNSPLASH)),
            genres: vec!["Drama".to_string(), "Romance".to_string(), "Slice of Life".to_string()],
            status: MangaStatus::Completed,
            rating: 4.8,
            views: 2_500_000,
            favorites: 12_500,
            kind: MangaKind::Manga,
            is_featured: true,
            is_trending: true,
            chapters: vec![
                chapter(
                    "1",
                    "Rainy Morning",
                    (2023, 1, 15),
                    &[
                        "1578632292335-df3abbb0d586",
                        "1490750967868-88aa4486c946",
                        "1506905925346-21bda4d32df4",
                        "1518495973542-4542c06a5843",
                        "1441974231531-c6227db76b6e",
                    ],
                ),
                chapter(
                    "2",
                    "The Garden Meeting",
                    (2023, 1, 22),
                    &[
                        "1519681393784-d120267933ba",
                        "1501594907352-04cda38ebc29",
                        "1470071459604-3b5ec3a7fe05",
                        "1472214103451-9374bd1c798e",
                        "1475924156734-496f6cac6ec1",
                    ],
                ),
                chapter(
                    "3",
                    "Hidden Hearts",
                    (2023, 1, 29),
                    &[
                        "1469474968028-56623f02e42e",
                        "1482192505345-5655af888cc4",
                        "1426604966848-d7adac402bff",
                        "1502781252888-9143ba7f074e",
                        "1447752875215-b2761acb3c5d",
                    ],
                ),
            ],
            created_by: None,
            created_at: None,
            updated_at: None,
        },
        Manga {
            id: "2".to_string(),
            title: "Tower Climb".to_string(),
            subtitle: None,
            author: "Studio Ascend".to_string(),
            artist: None,
            description: "A long-strip serial about a climber chasing the top floor.".to_string(),
            cover_image: Some(format!("{}/photo-1500530855697-b586d89ba3ee?w=400&h=600&fit=crop", UNSPLASH)),
            banner_image: None,
            genres: vec!["Action".to_string(), "Fantasy".to_string()],
            status: MangaStatus::Ongoing,
            rating: 4.3,
            views: 870_000,
            favorites: 4_100,
            kind: MangaKind::Webtoon,
            is_featured: false,
            is_trending: true,
            chapters: vec![
                chapter(
                    "1",
                    "Ground Floor",
                    (2024, 3, 2),
                    &[
                        "1500530855697-b586d89ba3ee",
                        "1464822759023-fed622ff2c3b",
                        "1454496522488-7a8e488e8606",
                    ],
                ),
                chapter(
                    "2",
                    "The First Gate",
                    (2024, 3, 9),
                    &["1483728642387-6c3bdd6c93e5", "1486870591958-9b9d0d1dda99"],
                ),
            ],
            created_by: None,
            created_at: None,
            updated_at: None,
        },
    ]
}

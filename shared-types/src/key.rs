use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of one piece of editable site content.
///
/// The enum is the allow-list: anything that does not parse into a variant is
/// rejected before it can reach storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKey {
    ServicesData,
    PortfolioData,
    TestimonialsData,
    NewsData,
    MarketsData,
    SocialLinks,
    LeadershipTeam,
    TeamMembers,
    HeroSubtitle,
    HeroDescription,
    TypewriterTexts,
    StatsData,
    HeroBackground,
    AboutHeroBackground,
    ServicesHeroBackground,
    PortfolioHeroBackground,
    NewsHeroBackground,
    MarketsHeroBackground,
    CareersHeroBackground,
    ContactHeroBackground,
}

/// Where the value for a key lives in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// One `{key, image}` document per key in the image collection.
    Image,
    /// A field of the shared site settings document.
    Settings(&'static str),
    /// A field of the shared team document.
    Team(&'static str),
    /// A dedicated collection of records, replaced wholesale on write.
    Collection(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown content key: {0}")]
pub struct KeyParseError(pub String);

impl ContentKey {
    pub const ALL: [ContentKey; 20] = [
        ContentKey::ServicesData,
        ContentKey::PortfolioData,
        ContentKey::TestimonialsData,
        ContentKey::NewsData,
        ContentKey::MarketsData,
        ContentKey::SocialLinks,
        ContentKey::LeadershipTeam,
        ContentKey::TeamMembers,
        ContentKey::HeroSubtitle,
        ContentKey::HeroDescription,
        ContentKey::TypewriterTexts,
        ContentKey::StatsData,
        ContentKey::HeroBackground,
        ContentKey::AboutHeroBackground,
        ContentKey::ServicesHeroBackground,
        ContentKey::PortfolioHeroBackground,
        ContentKey::NewsHeroBackground,
        ContentKey::MarketsHeroBackground,
        ContentKey::CareersHeroBackground,
        ContentKey::ContactHeroBackground,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ContentKey::ServicesData => "services-data",
            ContentKey::PortfolioData => "portfolio-data",
            ContentKey::TestimonialsData => "testimonials-data",
            ContentKey::NewsData => "news-data",
            ContentKey::MarketsData => "markets-data",
            ContentKey::SocialLinks => "social-links",
            ContentKey::LeadershipTeam => "leadership-team",
            ContentKey::TeamMembers => "team-members",
            ContentKey::HeroSubtitle => "hero-subtitle",
            ContentKey::HeroDescription => "hero-description",
            ContentKey::TypewriterTexts => "typewriter-texts",
            ContentKey::StatsData => "stats-data",
            ContentKey::HeroBackground => "hero-background",
            ContentKey::AboutHeroBackground => "about-hero-background",
            ContentKey::ServicesHeroBackground => "services-hero-background",
            ContentKey::PortfolioHeroBackground => "portfolio-hero-background",
            ContentKey::NewsHeroBackground => "news-hero-background",
            ContentKey::MarketsHeroBackground => "markets-hero-background",
            ContentKey::CareersHeroBackground => "careers-hero-background",
            ContentKey::ContactHeroBackground => "contact-hero-background",
        }
    }

    /// Storage route for this key. Exhaustive on purpose: adding a key
    /// without deciding where it lives does not compile.
    pub const fn route(self) -> Route {
        match self {
            ContentKey::ServicesData => Route::Collection("services"),
            ContentKey::PortfolioData => Route::Collection("portfolio"),
            ContentKey::TestimonialsData => Route::Collection("testimonials"),
            ContentKey::NewsData => Route::Collection("news"),
            ContentKey::MarketsData => Route::Collection("markets"),
            ContentKey::SocialLinks => Route::Collection("social_links"),
            ContentKey::LeadershipTeam => Route::Team("leadership"),
            ContentKey::TeamMembers => Route::Team("members"),
            ContentKey::HeroSubtitle => Route::Settings("heroSubtitle"),
            ContentKey::HeroDescription => Route::Settings("heroDescription"),
            ContentKey::TypewriterTexts => Route::Settings("typewriterTexts"),
            ContentKey::StatsData => Route::Settings("stats"),
            ContentKey::HeroBackground
            | ContentKey::AboutHeroBackground
            | ContentKey::ServicesHeroBackground
            | ContentKey::PortfolioHeroBackground
            | ContentKey::NewsHeroBackground
            | ContentKey::MarketsHeroBackground
            | ContentKey::CareersHeroBackground
            | ContentKey::ContactHeroBackground => Route::Image,
        }
    }

    /// Site pages that render this key and need revalidating after a write.
    pub const fn pages(self) -> &'static [&'static str] {
        match self {
            ContentKey::ServicesData | ContentKey::ServicesHeroBackground => &["/", "/services"],
            ContentKey::PortfolioData | ContentKey::PortfolioHeroBackground => {
                &["/", "/portfolio"]
            }
            ContentKey::TestimonialsData => &["/", "/about"],
            ContentKey::NewsData | ContentKey::NewsHeroBackground => &["/", "/news"],
            ContentKey::MarketsData | ContentKey::MarketsHeroBackground => &["/markets"],
            ContentKey::LeadershipTeam | ContentKey::TeamMembers => &["/about", "/team"],
            ContentKey::AboutHeroBackground => &["/about"],
            ContentKey::CareersHeroBackground => &["/careers"],
            ContentKey::ContactHeroBackground => &["/contact"],
            ContentKey::SocialLinks => &["/", "/contact"],
            ContentKey::HeroSubtitle
            | ContentKey::HeroDescription
            | ContentKey::TypewriterTexts
            | ContentKey::StatsData
            | ContentKey::HeroBackground => &["/"],
        }
    }

    pub const fn is_collection(self) -> bool {
        matches!(self.route(), Route::Collection(_))
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| KeyParseError(s.to_string()))
    }
}

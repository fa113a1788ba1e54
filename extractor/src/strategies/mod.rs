//! Strategy implementations

pub mod dailymotion;
pub mod largest_image;
mod oembed;
pub mod opengraph;
pub mod page;
pub mod schema_org;
pub mod twitter_card;
pub mod vimeo;
pub mod youtube;

/// Built-in strategies in registry order
///
/// Platform strategies come first; `largest_image` is the most expensive and stays last.
pub(crate) fn registry_items() -> Vec<crate::factory::RegistryItem> {
    vec![
        youtube::__STRATEGY_REGISTRY_YOUTUBESTATIC(),
        vimeo::__STRATEGY_REGISTRY_VIMEOOEMBED(),
        dailymotion::__STRATEGY_REGISTRY_DAILYMOTIONOEMBED(),
        opengraph::__STRATEGY_REGISTRY_OPENGRAPH(),
        twitter_card::__STRATEGY_REGISTRY_TWITTERCARD(),
        schema_org::__STRATEGY_REGISTRY_SCHEMAORG(),
        largest_image::__STRATEGY_REGISTRY_LARGESTIMAGE(),
    ]
}

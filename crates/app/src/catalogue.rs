use std::path::Path;

use anyhow::Context;
use telaura_core::MediaItem;

const DEFAULT_PRODUCTS: &[(&str, &str)] = &[
    (
        "https://store.storeimages.cdn-apple.com/4982/as-images.apple.com/is/iphone-15-pro-finish-select-202309-6-1inch-naturaltitanium?wid=5120&hei=2880&fmt=p-jpg&qlt=80&.v=1692910040844",
        "iPhone Series",
    ),
    (
        "https://store.storeimages.cdn-apple.com/4982/as-images.apple.com/is/mbp-14-spacegray-select-202310?wid=904&hei=840&fmt=jpeg&qlt=90&.v=1697239362529",
        "Premium Laptops",
    ),
    (
        "https://store.storeimages.cdn-apple.com/4982/as-images.apple.com/is/airpods-pro-2-select-202409?wid=400&hei=400&fmt=jpeg&qlt=90&.v=1724369387133",
        "Accessories",
    ),
    (
        "https://store.storeimages.cdn-apple.com/4982/as-images.apple.com/is/watch-ultra2-49-titanium-alpine-loop-blue-202409?wid=400&hei=400&fmt=jpeg&qlt=90&.v=1724369387133",
        "Smart Watches",
    ),
    (
        "https://m.media-amazon.com/images/I/81p4nB1tU8L._AC_SL1500_.jpg",
        "Android Phones",
    ),
    (
        "https://store.storeimages.cdn-apple.com/4982/as-images.apple.com/is/ipad-pro-finish-select-202405-13inch-spaceblack?wid=400&hei=400&fmt=jpeg&qlt=90&.v=1724369387133",
        "Tablets",
    ),
];

/// Product categories shown on the storefront home page.
pub fn default_catalogue() -> Vec<MediaItem> {
    DEFAULT_PRODUCTS
        .iter()
        .map(|(image, title)| MediaItem::new(*image, *title))
        .collect()
}

/// Reads a JSON manifest of `{ "image", "title" }` entries.
pub fn load_manifest(path: &Path) -> anyhow::Result<Vec<MediaItem>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading manifest {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing manifest {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalogue_lists_six_categories() {
        let items = default_catalogue();
        assert_eq!(items.len(), 6);
        assert_eq!(items[0].caption, "iPhone Series");
        assert_eq!(items[5].caption, "Tablets");
        assert!(items.iter().all(|item| item.source_url.starts_with("https://")));
    }

    #[test]
    fn manifest_uses_image_and_title_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(
            &path,
            r#"[{"image":"shots/watch.png","title":"Smart Watches"},{"image":"shots/tab.png"}]"#,
        )
        .unwrap();

        let items = load_manifest(&path).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], MediaItem::new("shots/watch.png", "Smart Watches"));
        assert_eq!(items[1].caption, "");
    }
}

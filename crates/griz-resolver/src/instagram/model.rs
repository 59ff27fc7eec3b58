//! The subset of Instagram's embedded media JSON needed to locate photos.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct EmbedResponse {
    #[serde(rename = "shortcode_media")]
    pub media: Media,
}

impl EmbedResponse {
    /// Whether the page carried no media JSON at all.
    pub fn is_empty(&self) -> bool {
        self.media.id.is_empty()
    }

    /// Smallest rendition of every carousel photo, else the single display URL.
    /// Video posts yield nothing.
    pub fn photo_urls(&self) -> Vec<String> {
        if self.media.is_video {
            return Vec::new();
        }

        let urls = self.media.sidecar.lowest_image_urls();
        if urls.is_empty() && !self.media.display_url.is_empty() {
            return vec![self.media.display_url.clone()];
        }
        urls
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Media {
    pub id: String,
    pub is_video: bool,
    pub display_url: String,
    #[serde(rename = "edge_sidecar_to_children")]
    pub sidecar: EdgeSidecar,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct EdgeSidecar {
    pub edges: Vec<Edge>,
}

impl EdgeSidecar {
    fn lowest_image_urls(&self) -> Vec<String> {
        self.edges
            .iter()
            .filter_map(|edge| edge.node.lowest_image_url())
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Edge {
    pub node: Node,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Node {
    pub is_video: bool,
    pub display_url: String,
    pub display_resources: Vec<DisplayResource>,
}

impl Node {
    fn lowest_image_url(&self) -> Option<String> {
        if self.is_video {
            return None;
        }

        let url = self
            .display_resources
            .iter()
            .min_by_key(|resource| resource.config_width)
            .map_or(&self.display_url, |resource| &resource.src);

        (!url.is_empty()).then(|| url.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct DisplayResource {
    pub config_width: u32,
    pub src: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(width: u32, src: &str) -> DisplayResource {
        DisplayResource {
            config_width: width,
            src: src.to_string(),
        }
    }

    fn node(is_video: bool, display_url: &str, resources: Vec<DisplayResource>) -> Node {
        Node {
            is_video,
            display_url: display_url.to_string(),
            display_resources: resources,
        }
    }

    #[test]
    fn lowest_image_url() {
        let cases = [
            (node(false, "abc", vec![]), Some("abc")),
            (
                node(false, "abc", vec![resource(7, "zxc"), resource(5, "qwe")]),
                Some("qwe"),
            ),
            (node(true, "abc", vec![resource(5, "qwe")]), None),
            (node(false, "", vec![]), None),
            (node(false, "a", vec![]), Some("a")),
        ];

        for (node, expected) in cases {
            assert_eq!(node.lowest_image_url().as_deref(), expected, "{node:?}");
        }
    }

    #[test]
    fn sidecar_skips_videos() {
        let sidecar = EdgeSidecar {
            edges: vec![
                Edge {
                    node: node(false, "abc", vec![]),
                },
                Edge {
                    node: node(false, "abc", vec![resource(5, "qwe"), resource(7, "zxc")]),
                },
                Edge {
                    node: node(true, "abc", vec![resource(5, "qwe")]),
                },
            ],
        };
        assert_eq!(sidecar.lowest_image_urls(), ["abc", "qwe"]);
    }

    #[test]
    fn single_photo_post_falls_back_to_display_url() {
        let json = r#"{"shortcode_media": {"id": "1", "is_video": false, "display_url": "https://cdn/one.jpg"}}"#;
        let embed: EmbedResponse = serde_json::from_str(json).unwrap();
        assert!(!embed.is_empty());
        assert_eq!(embed.photo_urls(), ["https://cdn/one.jpg"]);
    }

    #[test]
    fn video_post_has_no_photos() {
        let json = r#"{"shortcode_media": {"id": "1", "is_video": true, "display_url": "https://cdn/v.jpg"}}"#;
        let embed: EmbedResponse = serde_json::from_str(json).unwrap();
        assert!(embed.photo_urls().is_empty());
    }

    #[test]
    fn carousel_post() {
        let json = r#"{
            "shortcode_media": {
                "id": "42",
                "__typename": "GraphSidecar",
                "display_url": "https://cdn/cover.jpg",
                "edge_sidecar_to_children": {"edges": [
                    {"node": {"is_video": false, "display_url": "https://cdn/1-big.jpg",
                              "display_resources": [
                                  {"config_width": 1080, "config_height": 1080, "src": "https://cdn/1-big.jpg"},
                                  {"config_width": 640, "config_height": 640, "src": "https://cdn/1-small.jpg"}
                              ]}},
                    {"node": {"is_video": true, "display_url": "https://cdn/2.jpg"}},
                    {"node": {"is_video": false, "display_url": "https://cdn/3.jpg"}}
                ]}
            }
        }"#;
        let embed: EmbedResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            embed.photo_urls(),
            ["https://cdn/1-small.jpg", "https://cdn/3.jpg"]
        );
    }
}

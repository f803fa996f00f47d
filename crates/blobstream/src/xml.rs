//! XML metadata segment parsing.
//!
//! Segment 0 of every blob is an XML document describing the camera and
//! the datasets present in the binary segments that follow. The parsed
//! result is cached against the segment's change counter so an unchanged
//! document is not reparsed.

use crate::error::Result;
use crate::frame::{CameraParameters, DataSetsActive};
use roxmltree::{Document, Node};

/// Map the textual element types to byte widths; anything else is 0.
pub fn item_length(data_type: &str) -> u32 {
    match data_type.to_ascii_lowercase().as_str() {
        "uint8" => 1,
        "uint16" => 2,
        "uint32" => 4,
        "uint64" => 8,
        _ => 0,
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn descend<'a, 'input>(node: Node<'a, 'input>, path: &[&str]) -> Option<Node<'a, 'input>> {
    let mut current = node;
    for name in path {
        current = child(current, name)?;
    }
    Some(current)
}

fn text_value<T: std::str::FromStr>(node: Node<'_, '_>) -> Option<T> {
    node.text()?.trim().parse().ok()
}

/// Cached camera description and dataset activity parsed from the
/// metadata segment.
#[derive(Debug, Clone, Default)]
pub struct MetadataCache {
    pub camera: CameraParameters,
    pub datasets: DataSetsActive,
    pub distance_byte_depth: u32,
    pub intensity_byte_depth: u32,
    pub state_byte_depth: u32,
    /// Distance word scale in millimeters, fixed at 0.25 for this family.
    pub scale_z: f32,
    change_counter: Option<u32>,
}

impl MetadataCache {
    pub fn change_counter(&self) -> Option<u32> {
        self.change_counter
    }

    /// Parse the metadata document. A matching change counter makes this a
    /// no-op; an XML syntax error leaves the cache untouched. Incomplete
    /// documents succeed with camera parameters reset to their defaults.
    pub fn parse(&mut self, xml: &str, change_counter: u32) -> Result<()> {
        if self.change_counter == Some(change_counter) {
            return Ok(());
        }

        let document = Document::parse(xml)?;
        let root = document.root();

        let mut parse_ok = true;
        let data_sets = descend(root, &["SickRecord", "DataSets"]);
        match data_sets {
            Some(node) => {
                self.datasets = DataSetsActive {
                    depth_map: child(node, "DataSetDepthMap").is_some(),
                    polar_2d: child(node, "DataSetPolar2D").is_some(),
                    cartesian: child(node, "DataSetCartesian").is_some(),
                    device_status: child(node, "DataSetDeviceStatus").is_some(),
                    roi: child(node, "DataSetROI").is_some(),
                    local_ios: child(node, "DataSetLocalIOs").is_some(),
                    field_information: child(node, "DataSetFieldInformation").is_some(),
                    logic_signals: child(node, "DataSetLogicalSignals").is_some(),
                    imu: child(node, "DataSetIMU").is_some(),
                };
            }
            None => parse_ok = false,
        }

        let data_stream = data_sets.and_then(|node| {
            descend(
                node,
                &["DataSetDepthMap", "FormatDescriptionDepthMap", "DataStream"],
            )
        });
        if data_stream.is_none() {
            parse_ok = false;
        }

        if let Some(stream) = data_stream {
            match child(stream, "Width").and_then(text_value::<u32>) {
                Some(width) => self.camera.width = width,
                None => parse_ok = false,
            }
            match child(stream, "Height").and_then(text_value::<u32>) {
                Some(height) => self.camera.height = height,
                None => parse_ok = false,
            }

            if self.datasets.depth_map {
                match Self::read_matrix(stream) {
                    Some(matrix) => self.camera.cam2world_matrix = matrix,
                    None => parse_ok = false,
                }
            } else {
                self.camera.cam2world_matrix = crate::frame::IDENTITY_MATRIX;
            }

            let mut read_double = |path: &[&str], target: &mut f64| {
                match descend(stream, path).and_then(text_value::<f64>) {
                    Some(value) => *target = value,
                    None => parse_ok = false,
                }
            };
            read_double(&["CameraMatrix", "FX"], &mut self.camera.fx);
            read_double(&["CameraMatrix", "FY"], &mut self.camera.fy);
            read_double(&["CameraMatrix", "CX"], &mut self.camera.cx);
            read_double(&["CameraMatrix", "CY"], &mut self.camera.cy);
            read_double(&["CameraDistortionParams", "K1"], &mut self.camera.k1);
            read_double(&["CameraDistortionParams", "K2"], &mut self.camera.k2);
            read_double(&["CameraDistortionParams", "P1"], &mut self.camera.p1);
            read_double(&["CameraDistortionParams", "P2"], &mut self.camera.p2);
            read_double(&["CameraDistortionParams", "K3"], &mut self.camera.k3);
            read_double(&["FocalToRayCross"], &mut self.camera.f2rc);

            let text_of = |name: &str| {
                child(stream, name)
                    .and_then(|n| n.text())
                    .unwrap_or_default()
                    .trim()
                    .to_owned()
            };
            self.distance_byte_depth = item_length(&text_of("Distance"));
            self.intensity_byte_depth = item_length(&text_of("Intensity"));
            self.state_byte_depth = item_length(&text_of("Confidence"));
        }

        self.scale_z = crate::frame::DISTANCE_MAP_UNIT_MM;

        if !parse_ok {
            tracing::debug!("incomplete metadata document, camera parameters reset");
            self.camera = CameraParameters::default();
            self.distance_byte_depth = 0;
            self.intensity_byte_depth = 0;
            self.state_byte_depth = 0;
        }

        self.change_counter = Some(change_counter);
        Ok(())
    }

    fn read_matrix(stream: Node<'_, '_>) -> Option<[f64; 16]> {
        let transform = child(stream, "CameraToWorldTransform")?;
        let mut matrix = [0.0f64; 16];
        let mut entries = transform.children().filter(|n| n.is_element());
        for slot in matrix.iter_mut() {
            *slot = text_value(entries.next()?)?;
        }
        Some(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_document() -> String {
        let matrix_entries: String = (0..16)
            .map(|i| format!("<v>{}.5</v>", i))
            .collect();
        format!(
            "<SickRecord><DataSets>\
             <DataSetDepthMap><FormatDescriptionDepthMap><DataStream>\
             <Width>6</Width><Height>4</Height>\
             <CameraToWorldTransform>{matrix_entries}</CameraToWorldTransform>\
             <CameraMatrix><FX>520.5</FX><FY>521.5</FY><CX>319.5</CX><CY>239.5</CY></CameraMatrix>\
             <CameraDistortionParams><K1>0.1</K1><K2>0.2</K2><P1>0.3</P1><P2>0.4</P2><K3>0.5</K3></CameraDistortionParams>\
             <FocalToRayCross>2.75</FocalToRayCross>\
             <Distance>uint16</Distance><Intensity>uint16</Intensity><Confidence>uint8</Confidence>\
             </DataStream></FormatDescriptionDepthMap></DataSetDepthMap>\
             <DataSetDeviceStatus/><DataSetROI/>\
             </DataSets></SickRecord>"
        )
    }

    #[test]
    fn parses_a_complete_document() {
        let mut cache = MetadataCache::default();
        cache.parse(&full_document(), 1).unwrap();

        assert_eq!(cache.camera.width, 6);
        assert_eq!(cache.camera.height, 4);
        assert_eq!(cache.camera.fx, 520.5);
        assert_eq!(cache.camera.k3, 0.5);
        assert_eq!(cache.camera.f2rc, 2.75);
        assert_eq!(cache.camera.cam2world_matrix[0], 0.5);
        assert_eq!(cache.camera.cam2world_matrix[15], 15.5);
        assert_eq!(cache.distance_byte_depth, 2);
        assert_eq!(cache.intensity_byte_depth, 2);
        assert_eq!(cache.state_byte_depth, 1);
        assert_eq!(cache.scale_z, 0.25);
        assert!(cache.datasets.depth_map);
        assert!(cache.datasets.device_status);
        assert!(cache.datasets.roi);
        assert!(!cache.datasets.imu);
        assert_eq!(cache.change_counter(), Some(1));
    }

    #[test]
    fn matching_change_counter_skips_reparsing() {
        let mut cache = MetadataCache::default();
        cache.parse(&full_document(), 7).unwrap();
        let width_before = cache.camera.width;

        // Same counter with a now-broken document: parse must not run.
        cache.parse("<not-xml", 7).unwrap();
        assert_eq!(cache.camera.width, width_before);
    }

    #[test]
    fn syntax_error_leaves_cache_untouched() {
        let mut cache = MetadataCache::default();
        cache.parse(&full_document(), 1).unwrap();

        assert!(cache.parse("<broken><", 2).is_err());
        assert_eq!(cache.change_counter(), Some(1));
        assert_eq!(cache.camera.width, 6);
    }

    #[test]
    fn incomplete_document_resets_camera_to_defaults() {
        let mut cache = MetadataCache::default();
        cache.parse(&full_document(), 1).unwrap();

        let partial = "<SickRecord><DataSets><DataSetDepthMap>\
                       <FormatDescriptionDepthMap><DataStream>\
                       <Width>6</Width><Height>4</Height>\
                       </DataStream></FormatDescriptionDepthMap>\
                       </DataSetDepthMap></DataSets></SickRecord>";
        cache.parse(partial, 2).unwrap();

        assert_eq!(cache.camera.width, 0);
        assert_eq!(cache.camera.fx, 0.0);
        assert_eq!(cache.camera.cam2world_matrix, crate::frame::IDENTITY_MATRIX);
        assert_eq!(cache.distance_byte_depth, 0);
        assert_eq!(cache.change_counter(), Some(2));
    }

    #[test]
    fn item_length_mapping() {
        assert_eq!(item_length("uint8"), 1);
        assert_eq!(item_length("UInt16"), 2);
        assert_eq!(item_length("uint32"), 4);
        assert_eq!(item_length("uint64"), 8);
        assert_eq!(item_length(""), 0);
        assert_eq!(item_length("float"), 0);
    }
}

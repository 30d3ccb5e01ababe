use crate::types::ElementTable;
use dicom_core::Tag;

// Identification Tags
pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
pub const SERIES_INSTANCE_UID: Tag = Tag(0x0020, 0x000E);
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);
pub const INSTANCE_NUMBER: Tag = Tag(0x0020, 0x0013);
pub const SERIES_NUMBER: Tag = Tag(0x0020, 0x0011);
pub const ACCESSION_NUMBER: Tag = Tag(0x0008, 0x0050);
pub const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);

// Description Tags
pub const MODALITY: Tag = Tag(0x0008, 0x0060);
pub const IMAGE_TYPE: Tag = Tag(0x0008, 0x0008);
pub const STUDY_DESCRIPTION: Tag = Tag(0x0008, 0x1030);
pub const SERIES_DESCRIPTION: Tag = Tag(0x0008, 0x103E);
pub const BODY_PART_EXAMINED: Tag = Tag(0x0018, 0x0015);
pub const PROTOCOL_NAME: Tag = Tag(0x0018, 0x1030);
pub const PERFORMED_PROCEDURE_STEP_DESCRIPTION: Tag = Tag(0x0040, 0x0254);
pub const REQUESTED_PROCEDURE_DESCRIPTION: Tag = Tag(0x0032, 0x1060);

// Acquisition Tags
pub const SCAN_OPTIONS: Tag = Tag(0x0018, 0x0022);
pub const SLICE_THICKNESS: Tag = Tag(0x0018, 0x0050);
pub const SPACING_BETWEEN_SLICES: Tag = Tag(0x0018, 0x0088);
pub const KVP: Tag = Tag(0x0018, 0x0060);
pub const CONVOLUTION_KERNEL: Tag = Tag(0x0018, 0x1210);
pub const RECONSTRUCTION_DIAMETER: Tag = Tag(0x0018, 0x1100);
pub const PATIENT_POSITION: Tag = Tag(0x0018, 0x5100);

// Geometry Tags
pub const IMAGE_POSITION_PATIENT: Tag = Tag(0x0020, 0x0032);
pub const IMAGE_ORIENTATION_PATIENT: Tag = Tag(0x0020, 0x0037);
pub const PIXEL_SPACING: Tag = Tag(0x0028, 0x0030);
pub const PLANE_ORIENTATION_SEQUENCE: Tag = Tag(0x0020, 0x9116);
pub const PLANE_POSITION_SEQUENCE: Tag = Tag(0x0020, 0x9113);
pub const PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE: Tag = Tag(0x5200, 0x9230);
pub const SHARED_FUNCTIONAL_GROUPS_SEQUENCE: Tag = Tag(0x5200, 0x9229);

// Image Pixel Tags
pub const SAMPLES_PER_PIXEL: Tag = Tag(0x0028, 0x0002);
pub const PHOTOMETRIC_INTERPRETATION: Tag = Tag(0x0028, 0x0004);
pub const PLANAR_CONFIGURATION: Tag = Tag(0x0028, 0x0006);
pub const NUMBER_OF_FRAMES: Tag = Tag(0x0028, 0x0008);
pub const ROWS: Tag = Tag(0x0028, 0x0010);
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);
pub const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
pub const BITS_STORED: Tag = Tag(0x0028, 0x0101);
pub const PIXEL_REPRESENTATION: Tag = Tag(0x0028, 0x0103);
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

// Modality LUT / VOI Tags
pub const WINDOW_CENTER: Tag = Tag(0x0028, 0x1050);
pub const WINDOW_WIDTH: Tag = Tag(0x0028, 0x1051);
pub const RESCALE_INTERCEPT: Tag = Tag(0x0028, 0x1052);
pub const RESCALE_SLOPE: Tag = Tag(0x0028, 0x1053);

// Patient Tags
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
pub const PATIENT_BIRTH_DATE: Tag = Tag(0x0010, 0x0030);
pub const PATIENT_SEX: Tag = Tag(0x0010, 0x0040);
pub const PATIENT_AGE: Tag = Tag(0x0010, 0x1010);

// Date/Time Tags
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
pub const SERIES_DATE: Tag = Tag(0x0008, 0x0021);
pub const ACQUISITION_DATE: Tag = Tag(0x0008, 0x0022);
pub const CONTENT_DATE: Tag = Tag(0x0008, 0x0023);
pub const INSTANCE_CREATION_DATE: Tag = Tag(0x0008, 0x0012);
pub const STUDY_TIME: Tag = Tag(0x0008, 0x0030);
pub const SERIES_TIME: Tag = Tag(0x0008, 0x0031);
pub const ACQUISITION_TIME: Tag = Tag(0x0008, 0x0032);
pub const CONTENT_TIME: Tag = Tag(0x0008, 0x0033);
pub const INSTANCE_CREATION_TIME: Tag = Tag(0x0008, 0x0013);
pub const TIMEZONE_OFFSET_FROM_UTC: Tag = Tag(0x0008, 0x0201);

// Institution/Device Tags
pub const INSTITUTION_NAME: Tag = Tag(0x0008, 0x0080);
pub const INSTITUTION_ADDRESS: Tag = Tag(0x0008, 0x0081);
pub const REFERRING_PHYSICIAN_NAME: Tag = Tag(0x0008, 0x0090);
pub const MANUFACTURER: Tag = Tag(0x0008, 0x0070);
pub const MANUFACTURER_MODEL_NAME: Tag = Tag(0x0008, 0x1090);

/// One entry of the extraction catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub tag: Tag,
    /// DICOM keyword used as the output key
    pub name: &'static str,
}

const fn entry(tag: Tag, name: &'static str) -> CatalogEntry {
    CatalogEntry { tag, name }
}

/// Number of tags extracted from every file
pub const CATALOG_LEN: usize = 57;

/// The fixed set of tags extracted from every file
pub static TAG_CATALOG: [CatalogEntry; CATALOG_LEN] = [
    entry(STUDY_INSTANCE_UID, "StudyInstanceUID"),
    entry(SERIES_INSTANCE_UID, "SeriesInstanceUID"),
    entry(SOP_INSTANCE_UID, "SOPInstanceUID"),
    entry(INSTANCE_NUMBER, "InstanceNumber"),
    entry(MODALITY, "Modality"),
    entry(STUDY_DESCRIPTION, "StudyDescription"),
    entry(SERIES_DESCRIPTION, "SeriesDescription"),
    entry(BODY_PART_EXAMINED, "BodyPartExamined"),
    entry(SCAN_OPTIONS, "ScanOptions"),
    entry(SLICE_THICKNESS, "SliceThickness"),
    entry(PERFORMED_PROCEDURE_STEP_DESCRIPTION, "PerformedProcedureStepDescription"),
    entry(WINDOW_CENTER, "WindowCenter"),
    entry(WINDOW_WIDTH, "WindowWidth"),
    entry(IMAGE_POSITION_PATIENT, "ImagePositionPatient"),
    entry(PROTOCOL_NAME, "ProtocolName"),
    entry(RESCALE_INTERCEPT, "RescaleIntercept"),
    entry(RESCALE_SLOPE, "RescaleSlope"),
    entry(INSTITUTION_NAME, "InstitutionName"),
    entry(INSTITUTION_ADDRESS, "InstitutionAddress"),
    entry(PIXEL_SPACING, "PixelSpacing"),
    entry(PATIENT_NAME, "PatientName"),
    entry(PATIENT_BIRTH_DATE, "PatientBirthDate"),
    entry(PATIENT_SEX, "PatientSex"),
    entry(PATIENT_AGE, "PatientAge"),
    entry(PATIENT_ID, "PatientID"),
    entry(STUDY_DATE, "StudyDate"),
    entry(SERIES_DATE, "SeriesDate"),
    entry(ACQUISITION_DATE, "AcquisitionDate"),
    entry(CONTENT_DATE, "ContentDate"),
    entry(INSTANCE_CREATION_DATE, "InstanceCreationDate"),
    entry(STUDY_TIME, "StudyTime"),
    entry(SERIES_TIME, "SeriesTime"),
    entry(ACQUISITION_TIME, "AcquisitionTime"),
    entry(CONTENT_TIME, "ContentTime"),
    entry(INSTANCE_CREATION_TIME, "InstanceCreationTime"),
    entry(ACCESSION_NUMBER, "AccessionNumber"),
    entry(TIMEZONE_OFFSET_FROM_UTC, "TimezoneOffsetFromUTC"),
    entry(REFERRING_PHYSICIAN_NAME, "ReferringPhysicianName"),
    entry(IMAGE_ORIENTATION_PATIENT, "ImageOrientationPatient"),
    entry(PHOTOMETRIC_INTERPRETATION, "PhotometricInterpretation"),
    entry(REQUESTED_PROCEDURE_DESCRIPTION, "RequestedProcedureDescription"),
    entry(SERIES_NUMBER, "SeriesNumber"),
    entry(SPACING_BETWEEN_SLICES, "SpacingBetweenSlices"),
    entry(MANUFACTURER, "Manufacturer"),
    entry(MANUFACTURER_MODEL_NAME, "ManufacturerModelName"),
    entry(PATIENT_POSITION, "PatientPosition"),
    entry(CONVOLUTION_KERNEL, "ConvolutionKernel"),
    entry(RECONSTRUCTION_DIAMETER, "ReconstructionDiameter"),
    entry(KVP, "KVP"),
    entry(NUMBER_OF_FRAMES, "NumberOfFrames"),
    entry(PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE, "PerFrameFunctionalGroupsSequence"),
    entry(SHARED_FUNCTIONAL_GROUPS_SEQUENCE, "SharedFunctionalGroupsSequence"),
    entry(PLANE_ORIENTATION_SEQUENCE, "PlaneOrientationSequence"),
    entry(PLANE_POSITION_SEQUENCE, "PlanePositionSequence"),
    entry(IMAGE_TYPE, "ImageType"),
    entry(COLUMNS, "Columns"),
    entry(ROWS, "Rows"),
];

/// Name of a tag: its catalog keyword, or `Tag_GGGG_EEEE` for anything else
pub fn lookup(tag: Tag) -> String {
    TAG_CATALOG
        .iter()
        .find(|entry| entry.tag == tag)
        .map(|entry| entry.name.to_string())
        .unwrap_or_else(|| format!("Tag_{:04X}_{:04X}", tag.0, tag.1))
}

/// Helper to get an integer value from a top-level tag
///
/// Returns `None` if the tag is absent or not a whole number
pub fn get_int_value(table: &ElementTable, tag: Tag) -> Option<i64> {
    table.value(tag)?.ok()?.first_i64()
}

/// Helper to get a floating point value from a top-level tag
pub fn get_float_value(table: &ElementTable, tag: Tag) -> Option<f64> {
    table.value(tag)?.ok()?.first_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Endianness;
    use crate::types::{DataElement, ElementBody};
    use dicom_core::VR;
    use std::collections::HashSet;

    fn table_with(tag: Tag, vr: VR, bytes: &[u8]) -> ElementTable {
        let mut table = ElementTable::new();
        table.insert(DataElement::new(
            tag,
            vr,
            Endianness::Little,
            ElementBody::Primitive(bytes.to_vec()),
        ));
        table
    }

    #[test]
    fn test_catalog_has_unique_tags_and_names() {
        let tags: HashSet<Tag> = TAG_CATALOG.iter().map(|e| e.tag).collect();
        let names: HashSet<&str> = TAG_CATALOG.iter().map(|e| e.name).collect();
        assert_eq!(tags.len(), CATALOG_LEN);
        assert_eq!(names.len(), CATALOG_LEN);
    }

    #[test]
    fn test_catalog_order() {
        assert_eq!(TAG_CATALOG[0].name, "StudyInstanceUID");
        assert_eq!(TAG_CATALOG[CATALOG_LEN - 1].tag, ROWS);
    }

    #[test]
    fn test_lookup_known_tag() {
        assert_eq!(lookup(Tag(0x0010, 0x0010)), "PatientName");
        assert_eq!(lookup(Tag(0x5200, 0x9230)), "PerFrameFunctionalGroupsSequence");
    }

    #[test]
    fn test_lookup_synthesized_name() {
        assert_eq!(lookup(Tag(0x0009, 0x10ab)), "Tag_0009_10AB");
        assert_eq!(lookup(PIXEL_DATA), "Tag_7FE0_0010");
    }

    #[test]
    fn test_get_int_value() {
        let table = table_with(ROWS, VR::US, &512u16.to_le_bytes());
        assert_eq!(get_int_value(&table, ROWS), Some(512));

        let table = table_with(NUMBER_OF_FRAMES, VR::IS, b"12");
        assert_eq!(get_int_value(&table, NUMBER_OF_FRAMES), Some(12));
    }

    #[test]
    fn test_get_float_value() {
        let table = table_with(RESCALE_SLOPE, VR::DS, b"0.5 ");
        assert_eq!(get_float_value(&table, RESCALE_SLOPE), Some(0.5));
    }
}

/// Field and step name constants shared across the pipeline.
/// Field names match the listing export the model was trained on.

// Record fields
pub const POSTAL_CODE: &str = "PostalCode";
pub const PRICE: &str = "Price";
pub const LIVING_AREA: &str = "LivingArea";
pub const BEDROOM_COUNT: &str = "BedroomCount";
pub const GARDEN_AREA: &str = "GardenArea";
pub const CONDITION: &str = "Condition";
pub const EPC_SCORE: &str = "EPCScore";
pub const SALE_TYPE: &str = "SaleType";
pub const BID_STYLE_PRICING: &str = "BidStylePricing";
pub const PROPERTY_SUB_TYPE: &str = "PropertySubType";

// Reference table defaults
pub const DEFAULT_CODE_COLUMN: &str = "Refnis";

/// Sale-type tag that marks a listing as a residential sale observation
pub const RESIDENTIAL_SALE: &str = "residential_sale";

/// Amenity fields where an absent value means "not present"
pub const DEFAULT_FILL_ZERO_FIELDS: [&str; 8] = [
    "Furnished",
    "Fireplace",
    "Terrace",
    "TerraceArea",
    "Garden",
    "GardenArea",
    "SwimmingPool",
    BID_STYLE_PRICING,
];

// Step identifiers accepted in pipeline configuration
pub const STEP_FILTER_ROWS: &str = "filter_rows";
pub const STEP_REPLACE_NULLS: &str = "replace_nulls";
pub const STEP_JOIN_DATA: &str = "join_data";
pub const STEP_DROP_COLUMNS: &str = "drop_columns";
pub const STEP_ENCODE_CATEGORICAL: &str = "encode_categorical";
pub const STEP_RESCALE: &str = "rescale";

/// The canonical training order of the registered steps
pub fn default_steps() -> Vec<&'static str> {
    vec![
        STEP_FILTER_ROWS,
        STEP_REPLACE_NULLS,
        STEP_JOIN_DATA,
        STEP_DROP_COLUMNS,
        STEP_ENCODE_CATEGORICAL,
        STEP_RESCALE,
    ]
}

/// Marker a provider writes into the status column of checked readings
pub const VERIFIED_MARKER: &str = "geprüft";

/// Header label given to the first column of the coordinates block
pub const CRS_LABEL: &str = "crs";

/// Keys that carry a station's primary identifier, tried in order
pub const DEFAULT_IDENTIFIER_KEYS: [&str; 4] = ["ID", "Messstellennummer", "Pegelnummer", "Messstellen-Nr."];

/// Extensions of station source files, for matching requested file names
pub const DATA_FILE_EXTENSIONS: [&str; 9] =
    ["csv", "txt", "dat", "zip", "xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Data block columns
pub const DATE_COLUMN: usize = 0;
pub const VALUE_COLUMN: usize = 1;
pub const FLAG_COLUMN: usize = 2;

/// Text exports
pub const DEFAULT_TEXT_SEPARATOR: char = ';';
pub const DEFAULT_TEXT_DATE_FORMAT: &str = "%d.%m.%Y";
pub const DEFAULT_HEADER_LINES: usize = 0;

/// Input decoding
pub const DEFAULT_ENCODING: &str = "utf-8";
pub const DEFAULT_CSV_DELIMITER: char = ';';
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Output files
pub const METADATA_FILE: &str = "metadata.csv";
pub const METADATA_JSON_FILE: &str = "metadata.json";
pub const DIAGNOSTICS_FILE: &str = "diagnostics.json";
pub const NO_ID_FILE: &str = "metadata_no_id.csv";

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const CONFIG_ENV_PREFIX: &str = "HYDRO";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";

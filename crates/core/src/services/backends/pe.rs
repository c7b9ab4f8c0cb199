use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use goblin::pe::characteristic::IMAGE_FILE_EXECUTABLE_IMAGE;
use goblin::pe::PE;
use tracing::debug;

use crate::model::{BinaryKind, ModuleVersion};
use crate::services::backends::clr::read_clr;
use crate::services::backends::image::ImageView;
use crate::services::backends::version_info::read_resources;
use crate::services::inspector::{BinaryIdentity, BinaryInspector, InspectError};

const IMAGE_SUBSYSTEM_NATIVE: u16 = 1;

/// Inspector for Windows PE images (executables, DLLs, drivers, .NET assemblies).
pub struct PeInspector;

fn classify(pe: &PE) -> BinaryKind {
    let subsystem = pe.header.optional_header.as_ref().map(|oh| oh.windows_fields.subsystem);
    if pe.is_lib {
        BinaryKind::Library
    } else if subsystem == Some(IMAGE_SUBSYSTEM_NATIVE) {
        BinaryKind::Driver
    } else if pe.header.coff_header.characteristics & IMAGE_FILE_EXECUTABLE_IMAGE != 0 {
        BinaryKind::Executable
    } else {
        BinaryKind::Unknown
    }
}

/// Build an identity from an already parsed PE and its raw bytes.
pub fn identity_from_pe(pe: &PE, bytes: &[u8]) -> BinaryIdentity {
    let image = ImageView::new(bytes, &pe.sections);
    let mut identity = BinaryIdentity::new(classify(pe));

    identity.export_name = pe.name.map(str::to_string).filter(|n| !n.trim().is_empty());
    identity.export_version = pe.export_data.as_ref().map(|data| {
        let table = &data.export_directory_table;
        ModuleVersion::new([table.major_version, table.minor_version])
    });

    let Some(optional_header) = pe.header.optional_header.as_ref() else {
        return identity;
    };
    let directories = &optional_header.data_directories;

    if let Some(dir) = directories.get_resource_table().as_ref() {
        match read_resources(&image, dir.virtual_address) {
            Some(resources) => {
                identity.resource_version = resources.version;
                identity.version_entries = resources.version_entries;
            }
            None => debug!("resource directory at rva 0x{:X} is unreadable", dir.virtual_address),
        }
    }

    if let Some(dir) = directories.get_clr_runtime_header().as_ref() {
        match read_clr(&image, dir.virtual_address) {
            Some(clr) => {
                identity.module_name = clr.module_name;
                identity.assembly_version = clr.assembly_version;
            }
            None => debug!("CLI metadata at rva 0x{:X} is unreadable", dir.virtual_address),
        }
    }

    identity
}

impl PeInspector {
    fn load_bytes(path: &Path) -> Result<Vec<u8>, InspectError> {
        let open_err = |source: io::Error| InspectError::Open { path: path.to_path_buf(), source };
        let mut file = File::open(path).map_err(open_err)?;

        // Cheap rejection before reading the whole file.
        let mut magic = [0u8; 2];
        match file.read_exact(&mut magic) {
            Ok(()) if magic == *b"MZ" => {}
            Ok(()) => return Err(InspectError::NotAContainer("DOS Header magic not found".into())),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(InspectError::NotAContainer("file too small".into()))
            }
            Err(e) => return Err(open_err(e)),
        }

        let mut bytes = magic.to_vec();
        file.read_to_end(&mut bytes).map_err(open_err)?;
        Ok(bytes)
    }
}

impl BinaryInspector for PeInspector {
    fn inspect(&self, path: &Path) -> Result<BinaryIdentity, InspectError> {
        let bytes = Self::load_bytes(path)?;
        let pe = PE::parse(&bytes).map_err(|e| InspectError::NotAContainer(e.to_string()))?;
        Ok(identity_from_pe(&pe, &bytes))
    }

    fn name(&self) -> &'static str {
        "pe"
    }
}

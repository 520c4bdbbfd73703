use super::http_fetcher::HttpFetcher;
use super::repository_layout::RepositoryLayout;
use crate::analysis::domain::{BytecodeVersion, Gav};
use crate::ports::outbound::{BinaryInspector, PackageInfo};
use crate::shared::error::AnalysisError;
use crate::shared::Result;
use async_trait::async_trait;
use flate2::{Decompress, FlushDecompress, Status};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Prefix lengths requested one after another until a class header is found
const RANGE_STEPS: [u64; 4] = [8096, 16384, 131072, 524288];

const JAR_EXTENSION: &str = "jar";

const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x0807_4b50;
const LOCAL_HEADER_LEN: usize = 30;
const CLASS_MAGIC: u32 = 0xCAFE_BABE;
/// Magic, minor and major version
const CLASS_HEADER_LEN: usize = 8;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;
/// General purpose flag: sizes follow the data in a descriptor
const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;

/// Outcome of scanning an archive prefix for the first class file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Found(BytecodeVersion),
    /// The prefix ends before a class header could be read
    NeedMore,
    /// The local entries ended without any class file
    NoClasses,
}

/// JarInspector adapter measuring a package's primary file over HTTP
///
/// Jars are read with growing range requests, walking the ZIP local headers
/// until the first class file (other than `module-info.class`) is reached.
/// The total size and publication time come from the same responses, so
/// a small jar costs a single request.
pub struct JarInspector {
    fetcher: Arc<HttpFetcher>,
    layout: RepositoryLayout,
}

impl JarInspector {
    pub fn new(fetcher: Arc<HttpFetcher>, layout: RepositoryLayout) -> Self {
        Self { fetcher, layout }
    }

    async fn inspect_jar(&self, gav: &Gav) -> Result<PackageInfo> {
        let url = self.layout.file_url(gav, JAR_EXTENSION)?;
        let mut info = PackageInfo::default();

        for step in RANGE_STEPS {
            let response = self.fetcher.get_prefix(&url, step).await?;
            info.size = response.total_size;
            info.created = response.last_modified;

            match scan_archive(gav, &response.body)? {
                Scan::Found(version) => {
                    info.bytecode_version = Some(version);
                    break;
                }
                Scan::NoClasses => break,
                Scan::NeedMore => {}
            }

            let complete = response
                .total_size
                .is_some_and(|total| response.body.len() as u64 >= total);
            if complete {
                break;
            }
            debug!(gav = %gav, step, "Class header not within prefix, requesting more");
        }

        Ok(info)
    }

    async fn inspect_other(&self, gav: &Gav, extension: &str) -> Result<PackageInfo> {
        let url = self.layout.file_url(gav, extension)?;
        let head = self.fetcher.head(&url).await?;
        Ok(PackageInfo {
            size: head.content_length,
            bytecode_version: None,
            created: head.last_modified,
        })
    }
}

#[async_trait]
impl BinaryInspector for JarInspector {
    async fn inspect_package(
        &self,
        gav: &Gav,
        packaging: &str,
        available_extensions: &BTreeSet<String>,
    ) -> Result<PackageInfo> {
        if available_extensions.contains(JAR_EXTENSION) {
            return self.inspect_jar(gav).await;
        }
        if available_extensions.contains(packaging) {
            return self.inspect_other(gav, packaging).await;
        }
        debug!(gav = %gav, packaging, "No primary file to inspect");
        Ok(PackageInfo::default())
    }
}

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    data.get(offset..offset + 2)
        .map(|bytes| u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset + 4)
        .map(|bytes| u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn is_class_entry(name: &[u8]) -> bool {
    name.ends_with(b".class") && !name.ends_with(b"module-info.class")
}

/// Walks the local file headers of `archive` up to the first class file
fn scan_archive(gav: &Gav, archive: &[u8]) -> Result<Scan> {
    let mut offset = 0;

    loop {
        let Some(signature) = read_u32(archive, offset) else {
            return Ok(Scan::NeedMore);
        };
        if signature != LOCAL_HEADER_SIGNATURE {
            return Ok(Scan::NoClasses);
        }
        if archive.len() < offset + LOCAL_HEADER_LEN {
            return Ok(Scan::NeedMore);
        }

        let field16 = |at: usize| read_u16(archive, offset + at).unwrap_or_default();
        let flags = field16(6);
        let method = field16(8);
        let compressed_size = read_u32(archive, offset + 18).unwrap_or_default() as usize;
        let name_len = field16(26) as usize;
        let extra_len = field16(28) as usize;

        let name_start = offset + LOCAL_HEADER_LEN;
        let data_start = name_start + name_len + extra_len;
        let Some(name) = archive.get(name_start..name_start + name_len) else {
            return Ok(Scan::NeedMore);
        };
        let Some(data) = archive.get(data_start..) else {
            return Ok(Scan::NeedMore);
        };

        if is_class_entry(name) {
            let header = match method {
                METHOD_STORED => data.get(..CLASS_HEADER_LEN).map(<[u8]>::to_vec),
                METHOD_DEFLATED => inflate_prefix(gav, data, CLASS_HEADER_LEN)?,
                other => {
                    return Err(AnalysisError::invalid(
                        gav,
                        format!("Unsupported compression method {} in archive", other),
                    )
                    .into())
                }
            };
            return match header {
                Some(header) if header.len() >= CLASS_HEADER_LEN => {
                    parse_class_header(gav, &header).map(Scan::Found)
                }
                _ => Ok(Scan::NeedMore),
            };
        }

        let deferred_sizes = flags & FLAG_DATA_DESCRIPTOR != 0 && compressed_size == 0;
        offset = if !deferred_sizes {
            data_start + compressed_size
        } else if method == METHOD_DEFLATED {
            let Some(consumed) = deflated_length(gav, data)? else {
                return Ok(Scan::NeedMore);
            };
            let descriptor_start = data_start + consumed;
            match read_u32(archive, descriptor_start) {
                Some(DATA_DESCRIPTOR_SIGNATURE) => descriptor_start + 16,
                Some(_) => descriptor_start + 12,
                None => return Ok(Scan::NeedMore),
            }
        } else {
            // A stored entry of unknown length cannot be skipped
            return Ok(Scan::NoClasses);
        };
    }
}

/// Decodes magic, minor and major from the start of a class file
fn parse_class_header(gav: &Gav, header: &[u8]) -> Result<BytecodeVersion> {
    let magic = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    if magic != CLASS_MAGIC {
        return Err(AnalysisError::invalid(
            gav,
            format!("Class file has invalid magic 0x{:08X}", magic),
        )
        .into());
    }
    let minor = u16::from_be_bytes([header[4], header[5]]);
    let major = u16::from_be_bytes([header[6], header[7]]);
    Ok(BytecodeVersion::new(major.into(), minor.into()))
}

/// Inflates the first `wanted` bytes of a raw deflate stream.
///
/// Returns `None` when `data` ends before that many bytes are produced.
fn inflate_prefix(gav: &Gav, data: &[u8], wanted: usize) -> Result<Option<Vec<u8>>> {
    let mut inflater = Decompress::new(false);
    let mut output = Vec::with_capacity(wanted);

    loop {
        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out();
        let status = inflater
            .decompress_vec(&data[consumed..], &mut output, FlushDecompress::None)
            .map_err(|e| AnalysisError::invalid(gav, format!("Corrupt archive entry: {}", e)))?;

        if output.len() >= wanted || status == Status::StreamEnd {
            return Ok(Some(output));
        }
        if inflater.total_in() as usize == consumed && inflater.total_out() == produced {
            return Ok(None);
        }
    }
}

/// Length of the compressed stream at the start of `data`, if it ends there
fn deflated_length(gav: &Gav, data: &[u8]) -> Result<Option<usize>> {
    let mut inflater = Decompress::new(false);
    let mut sink = [0u8; 8192];

    loop {
        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out();
        let status = inflater
            .decompress(&data[consumed..], &mut sink, FlushDecompress::None)
            .map_err(|e| AnalysisError::invalid(gav, format!("Corrupt archive entry: {}", e)))?;

        if status == Status::StreamEnd {
            return Ok(Some(inflater.total_in() as usize));
        }
        if inflater.total_in() as usize == consumed && inflater.total_out() == produced {
            return Ok(None);
        }
    }
}

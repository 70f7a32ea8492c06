//! Fixed package parts: master, layouts, theme, properties.
//!
//! The layouts carry placeholder geometry as fractions of the slide size so
//! that non-default slide sizes still get sensible inherited frames.

use super::escape_xml;
use super::shape::Frame;
use std::fmt::{self, Write as FmtWrite};

pub const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub fn root_rels_xml() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="{NS_RELS}"><Relationship Id="rId1" Type="{REL_BASE}/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="{REL_BASE}/extended-properties" Target="docProps/app.xml"/></Relationships>"#
    )
}

/// `[Content_Types].xml` for `slide_count` slides.
pub fn content_types_xml(slide_count: usize) -> Result<String, fmt::Error> {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Default Extension="png" ContentType="image/png"/>"#);
    xml.push_str(r#"<Default Extension="jpeg" ContentType="image/jpeg"/>"#);

    let pml = "application/vnd.openxmlformats-officedocument.presentationml";
    write!(
        xml,
        r#"<Override PartName="/ppt/presentation.xml" ContentType="{pml}.presentation.main+xml"/>"#
    )?;
    write!(xml, r#"<Override PartName="/ppt/presProps.xml" ContentType="{pml}.presProps+xml"/>"#)?;
    write!(
        xml,
        r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="{pml}.slideMaster+xml"/>"#
    )?;
    for n in 1..=3 {
        write!(
            xml,
            r#"<Override PartName="/ppt/slideLayouts/slideLayout{n}.xml" ContentType="{pml}.slideLayout+xml"/>"#
        )?;
    }
    for n in 1..=slide_count {
        write!(
            xml,
            r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="{pml}.slide+xml"/>"#
        )?;
    }
    xml.push_str(
        r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
    );
    xml.push_str(
        r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
    );
    xml.push_str(
        r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
    );
    xml.push_str("</Types>");
    Ok(xml)
}

pub fn core_props_xml(title: &str) -> String {
    format!(
        r#"{XML_DECL}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{}</dc:title><dc:creator>edgequake-pptgen</dc:creator></cp:coreProperties>"#,
        escape_xml(title)
    )
}

pub fn app_props_xml(slide_count: usize) -> String {
    format!(
        r#"{XML_DECL}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>edgequake-pptgen</Application><Slides>{slide_count}</Slides><AppVersion>16.0000</AppVersion></Properties>"#
    )
}

pub fn pres_props_xml() -> String {
    format!(r#"{XML_DECL}<p:presentationPr xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"/>"#)
}

/// `ppt/presentation.xml`. Slide `i` is relationship `rId{i + 2}`.
pub fn presentation_xml(slide_count: usize, width: i64, height: i64) -> Result<String, fmt::Error> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    write!(
        xml,
        r#"<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1">"#
    )?;
    xml.push_str(
        r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
    );
    if slide_count > 0 {
        xml.push_str("<p:sldIdLst>");
        for i in 0..slide_count {
            write!(xml, r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2)?;
        }
        xml.push_str("</p:sldIdLst>");
    }
    write!(xml, r#"<p:sldSz cx="{width}" cy="{height}"/>"#)?;
    xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
    xml.push_str("</p:presentation>");
    Ok(xml)
}

/// `ppt/_rels/presentation.xml.rels`, matching [`presentation_xml`].
pub fn presentation_rels_xml(slide_count: usize) -> Result<String, fmt::Error> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    write!(xml, r#"<Relationships xmlns="{NS_RELS}">"#)?;
    write!(
        xml,
        r#"<Relationship Id="rId1" Type="{REL_BASE}/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#
    )?;
    for i in 0..slide_count {
        write!(
            xml,
            r#"<Relationship Id="rId{}" Type="{REL_BASE}/slide" Target="slides/slide{}.xml"/>"#,
            i + 2,
            i + 1
        )?;
    }
    write!(
        xml,
        r#"<Relationship Id="rId{}" Type="{REL_BASE}/presProps" Target="presProps.xml"/>"#,
        slide_count + 2
    )?;
    write!(
        xml,
        r#"<Relationship Id="rId{}" Type="{REL_BASE}/theme" Target="theme/theme1.xml"/>"#,
        slide_count + 3
    )?;
    xml.push_str("</Relationships>");
    Ok(xml)
}

fn frac(width: i64, height: i64, x: f64, y: f64, cx: f64, cy: f64) -> Frame {
    Frame::new(
        (width as f64 * x) as i64,
        (height as f64 * y) as i64,
        (width as f64 * cx) as i64,
        (height as f64 * cy) as i64,
    )
}

fn ph_sp(xml: &mut String, id: u32, name: &str, ph: &str, frame: Option<Frame>) -> fmt::Result {
    write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{ph}</p:nvPr></p:nvSpPr>"#
    )?;
    match frame {
        Some(f) => write!(
            xml,
            r#"<p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#,
            f.x, f.y, f.cx, f.cy
        )?,
        None => xml.push_str("<p:spPr/>"),
    }
    xml.push_str(
        r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#,
    );
    Ok(())
}

fn sp_tree_open(xml: &mut String) {
    xml.push_str(
        r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    );
    xml.push_str(
        r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
    );
}

pub fn slide_master_xml(width: i64, height: i64) -> Result<String, fmt::Error> {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    write!(xml, r#"<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}">"#)?;
    xml.push_str(r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#);
    sp_tree_open(&mut xml);
    ph_sp(
        &mut xml,
        2,
        "Title Placeholder 1",
        r#"<p:ph type="title"/>"#,
        Some(frac(width, height, 0.04, 0.06, 0.92, 0.13)),
    )?;
    ph_sp(
        &mut xml,
        3,
        "Text Placeholder 2",
        r#"<p:ph type="body" idx="1"/>"#,
        Some(frac(width, height, 0.04, 0.22, 0.92, 0.72)),
    )?;
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(
        r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
    );
    xml.push_str("<p:sldLayoutIdLst>");
    for n in 1..=3u32 {
        write!(xml, r#"<p:sldLayoutId id="{}" r:id="rId{}"/>"#, 2_147_483_648u32 + n, n)?;
    }
    xml.push_str("</p:sldLayoutIdLst>");
    xml.push_str("<p:txStyles>");
    xml.push_str(
        r#"<p:titleStyle><a:lvl1pPr algn="l"><a:defRPr sz="4400" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/><a:ea typeface="+mj-ea"/><a:cs typeface="+mj-cs"/></a:defRPr></a:lvl1pPr></p:titleStyle>"#,
    );
    xml.push_str(
        r#"<p:bodyStyle><a:lvl1pPr marL="0" indent="0" algn="l"><a:buNone/><a:defRPr sz="1800" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/><a:ea typeface="+mn-ea"/><a:cs typeface="+mn-cs"/></a:defRPr></a:lvl1pPr></p:bodyStyle>"#,
    );
    xml.push_str(
        r#"<p:otherStyle><a:lvl1pPr><a:defRPr sz="1800" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill></a:defRPr></a:lvl1pPr></p:otherStyle>"#,
    );
    xml.push_str("</p:txStyles></p:sldMaster>");
    Ok(xml)
}

pub fn slide_master_rels_xml() -> Result<String, fmt::Error> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    write!(xml, r#"<Relationships xmlns="{NS_RELS}">"#)?;
    for n in 1..=3 {
        write!(
            xml,
            r#"<Relationship Id="rId{n}" Type="{REL_BASE}/slideLayout" Target="../slideLayouts/slideLayout{n}.xml"/>"#
        )?;
    }
    write!(
        xml,
        r#"<Relationship Id="rId4" Type="{REL_BASE}/theme" Target="../theme/theme1.xml"/>"#
    )?;
    xml.push_str("</Relationships>");
    Ok(xml)
}

/// `slideLayout{number}.xml` for layouts 1 (cover), 2 (content), 3 (blank).
pub fn slide_layout_xml(number: usize, width: i64, height: i64) -> Result<String, fmt::Error> {
    let (kind, name) = match number {
        1 => ("title", "Title Slide"),
        2 => ("obj", "Title and Content"),
        _ => ("blank", "Blank"),
    };
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    write!(
        xml,
        r#"<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" type="{kind}" preserve="1">"#
    )?;
    write!(xml, r#"<p:cSld name="{name}">"#)?;
    sp_tree_open(&mut xml);
    match number {
        1 => {
            ph_sp(
                &mut xml,
                2,
                "Title 1",
                r#"<p:ph type="ctrTitle"/>"#,
                Some(frac(width, height, 0.075, 0.31, 0.85, 0.2)),
            )?;
            ph_sp(
                &mut xml,
                3,
                "Subtitle 2",
                r#"<p:ph type="subTitle" idx="1"/>"#,
                Some(frac(width, height, 0.075, 0.53, 0.85, 0.16)),
            )?;
        }
        2 => {
            ph_sp(&mut xml, 2, "Title 1", r#"<p:ph type="title"/>"#, None)?;
            ph_sp(&mut xml, 3, "Content Placeholder 2", r#"<p:ph idx="1"/>"#, None)?;
        }
        _ => {}
    }
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>");
    Ok(xml)
}

pub fn slide_layout_rels_xml() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="{NS_RELS}"><Relationship Id="rId1" Type="{REL_BASE}/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#
    )
}

/// Office-style theme with a neutral palette. `font` becomes the minor
/// (body) Latin and East Asian typeface.
pub fn theme_xml(font: &str) -> String {
    let font = escape_xml(font);
    let solid = |c: &str| format!(r#"<a:solidFill><a:schemeClr val="{c}"/></a:solidFill>"#);
    let line = |w: u32| {
        format!(r#"<a:ln w="{w}"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#)
    };
    let fills = solid("phClr").repeat(3);
    let lines = format!("{}{}{}", line(6350), line(12700), line(19050));
    format!(
        r#"{XML_DECL}<a:theme xmlns:a="{NS_A}" name="Office Theme"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F2937"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="{font}"/><a:ea typeface="{font}"/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="{font}"/><a:ea typeface="{font}"/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst>{fills}</a:fillStyleLst><a:lnStyleLst>{lines}</a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst>{fills}</a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"#
    )
}

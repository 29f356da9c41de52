//! HTML document access
//!
//! Wraps [`scraper::Html`] and hands out owned, typed views of the tags the
//! extractors care about. `Html` is not `Send`, so callers take what they need
//! from a [`Document`] and drop it before awaiting anything.

use ::scraper::{ElementRef, Html};

/// Tags read from a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Meta,
    Img,
    Title,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Meta => "meta",
            Tag::Img => "img",
            Tag::Title => "title",
        }
    }
}

/// Attributes read from those tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr {
    Property,
    Name,
    Content,
    Src,
    Alt,
    Width,
    Height,
}

impl Attr {
    pub fn as_str(self) -> &'static str {
        match self {
            Attr::Property => "property",
            Attr::Name => "name",
            Attr::Content => "content",
            Attr::Src => "src",
            Attr::Alt => "alt",
            Attr::Width => "width",
            Attr::Height => "height",
        }
    }
}

/// A `<meta>` tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaTag {
    pub property: Option<String>,
    pub name: Option<String>,
    pub content: Option<String>,
}

/// An `<img>` tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageTag {
    pub src: Option<String>,
    pub alt: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

/// A parsed HTML document
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a document. Parsing is lenient and never fails; broken markup
    /// yields whatever tree html5ever recovers.
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }

    /// Elements with the given tag name, in document order
    pub fn elements(&self, tag: Tag) -> impl Iterator<Item = Node<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(move |element| element.value().name() == tag.as_str())
            .map(|element| Node { element })
    }

    /// All `<meta>` tags in document order
    pub fn meta_tags(&self) -> Vec<MetaTag> {
        self.elements(Tag::Meta)
            .map(|node| MetaTag {
                property: node.owned_attr(Attr::Property),
                name: node.owned_attr(Attr::Name),
                content: node.owned_attr(Attr::Content),
            })
            .collect()
    }

    /// All `<img>` tags in document order
    pub fn image_tags(&self) -> Vec<ImageTag> {
        self.elements(Tag::Img)
            .map(|node| ImageTag {
                src: node.owned_attr(Attr::Src),
                alt: node.owned_attr(Attr::Alt),
                width: node.owned_attr(Attr::Width),
                height: node.owned_attr(Attr::Height),
            })
            .collect()
    }

    /// Text of the first `<title>` element, trimmed
    pub fn title(&self) -> Option<String> {
        self.elements(Tag::Title)
            .next()
            .map(|node| node.text().trim().to_string())
    }
}

/// One element of a [`Document`]
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    element: ElementRef<'a>,
}

impl<'a> Node<'a> {
    /// Value of an attribute, if present
    pub fn attr(&self, attr: Attr) -> Option<&'a str> {
        self.element.value().attr(attr.as_str())
    }

    /// Concatenated text content
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    fn owned_attr(&self, attr: Attr) -> Option<String> {
        self.attr(attr).map(str::to_string)
    }
}

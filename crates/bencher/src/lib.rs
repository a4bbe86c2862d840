#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    payload: Payload,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, payload: Payload) -> Self {
        Self { name, group, payload }
    }

    pub fn small(name: &'static str, payload: Payload) -> Self {
        Self::new(name, TestGroup::Small, payload)
    }

    pub fn large(name: &'static str, payload: Payload) -> Self {
        Self::new(name, TestGroup::Large, payload)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn media_type(&self) -> &'static str {
        self.payload().media_type
    }
}

/// A request body together with the `Content-Type` it is sent with.
#[derive(Debug, Copy, Clone)]
pub struct Payload {
    media_type: &'static str,
    content: &'static str,
}

impl Payload {
    pub const fn new(media_type: &'static str, content: &'static str) -> Self {
        Self { media_type, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn media_type(&self) -> &'static str {
        self.media_type
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Large,
}

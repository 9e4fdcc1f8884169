//! Metadata fixtures
//!
//! Builds an in-memory store shaped like the imaging repository.

use idr_graphql::{OpenSession, Params, SqliteSession};

pub const GENE_NS: &str = "openmicroscopy.org/mapr/gene";
pub const PHENOTYPE_NS: &str = "openmicroscopy.org/mapr/phenotype";

/// Builder for an in-memory metadata store
pub struct MetadataFixture {
    session: SqliteSession,
}

impl Default for MetadataFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataFixture {
    pub fn new() -> Self {
        Self {
            session: SqliteSession::open_in_memory().unwrap(),
        }
    }

    fn insert(self, sql: &str, params: Params) -> Self {
        self.session.execute(sql, &params).unwrap();
        self
    }

    fn container(self, table: &str, id: i64, name: &str) -> Self {
        let sql = format!("INSERT INTO {} (id, name) VALUES (:id, :name)", table);
        self.insert(&sql, Params::new().add_id(id).add_string("name", name))
    }

    fn link(self, table: &str, parent: i64, child: i64) -> Self {
        let sql = format!("INSERT INTO {} (parent, child) VALUES (:parent, :child)", table);
        self.insert(
            &sql,
            Params::new().add_long("parent", parent).add_long("child", child),
        )
    }

    pub fn project(self, id: i64, name: &str) -> Self {
        self.container("project", id, name)
    }

    pub fn dataset(self, id: i64, name: &str) -> Self {
        self.container("dataset", id, name)
    }

    pub fn image(self, id: i64, name: &str) -> Self {
        self.container("image", id, name)
    }

    pub fn project_dataset(self, project: i64, dataset: i64) -> Self {
        self.link("projectdatasetlink", project, dataset)
    }

    pub fn dataset_image(self, dataset: i64, image: i64) -> Self {
        self.link("datasetimagelink", dataset, image)
    }

    pub fn image_annotation(self, image: i64, annotation: i64) -> Self {
        self.link("imageannotationlink", image, annotation)
    }

    /// Add a map annotation; `pairs` keep their order
    pub fn map_annotation(mut self, id: i64, ns: &str, pairs: &[(&str, &str)]) -> Self {
        self = self.insert(
            "INSERT INTO annotation (id, discriminator, ns) VALUES (:id, 'MapAnnotation', :ns)",
            Params::new().add_id(id).add_string("ns", ns),
        );
        for (idx, (name, value)) in pairs.iter().enumerate() {
            self = self.insert(
                "INSERT INTO annotation_mapvalue (annotation_id, idx, name, value)
                 VALUES (:id, :idx, :name, :value)",
                Params::new()
                    .add_id(id)
                    .add_long("idx", idx as i64)
                    .add_string("name", *name)
                    .add_string("value", *value),
            );
        }
        self
    }

    pub fn build(self) -> SqliteSession {
        self.session
    }
}

/// A small repository with one screen-like project tree and a few tags
pub fn idr_fixture() -> SqliteSession {
    MetadataFixture::new()
        .project(151, "idr0021-lawo-pericentriolarmaterial/experimentA")
        .project(152, "idr0021-lawo-pericentriolarmaterial/experimentB")
        .dataset(369, "CDK5RAP2-C")
        .dataset(370, "PCNT")
        .image(1030631, "plate1_A01")
        .image(1030632, "plate1_A02")
        .image(1920095, "GSM1234_C1")
        .project_dataset(151, 370)
        .project_dataset(151, 369)
        .project_dataset(152, 369)
        .dataset_image(369, 1030632)
        .dataset_image(369, 1030631)
        .dataset_image(370, 1920095)
        .map_annotation(
            10,
            GENE_NS,
            &[("Gene Identifier", "ENSG00000147536"), ("Gene Symbol", "DJC5B")],
        )
        .map_annotation(
            11,
            PHENOTYPE_NS,
            &[
                ("Phenotype", "increased mitotic index"),
                ("Phenotype Term Accession", "CMPO_0000021"),
            ],
        )
        .map_annotation(12, GENE_NS, &[("Gene Symbol", "PCNT")])
        .map_annotation(13, "openmicroscopy.org/omero/bulk_annotations", &[("Well", "A01")])
        .image_annotation(1030631, 10)
        .image_annotation(1030631, 11)
        .image_annotation(1030631, 13)
        .image_annotation(1030632, 10)
        .image_annotation(1920095, 12)
        .build()
}

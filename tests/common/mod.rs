#![allow(dead_code, clippy::unwrap_used)]

pub mod temp_files {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::{SystemTime, UNIX_EPOCH};

    // Global counter and lock for thread-safe temporary file creation
    static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);
    static TEMP_LOCK: Mutex<()> = Mutex::new(());

    /// Creates a temporary file with guaranteed unique name to prevent race conditions
    pub fn create_temp_spec(content: &str, ext: &str) -> PathBuf {
        let _lock = TEMP_LOCK.lock().unwrap();
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::SeqCst);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();

        let path = std::env::temp_dir().join(format!(
            "zen_test_{}_{}_{}.{}",
            std::process::id(),
            counter,
            nanos,
            ext
        ));

        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn create_temp_yaml(content: &str) -> PathBuf {
        create_temp_spec(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> PathBuf {
        create_temp_spec(content, "json")
    }

    /// Cleanup temporary files (best effort)
    pub fn cleanup_temp_files(paths: &[PathBuf]) {
        for path in paths {
            let _ = std::fs::remove_file(path);
        }
    }
}

pub mod petstore {
    use zen_validation::runtime_config::ValidationConfig;
    use zen_validation::RequestValidator;

    /// Pet store document shared by the integration suites.
    pub const SPEC: &str = r##"
openapi: 3.1.0
info:
  title: Pet Store
  version: "1.0.0"
security:
  - bearerAuth: []
components:
  securitySchemes:
    bearerAuth: { type: http, scheme: bearer, bearerFormat: JWT }
    apiKey: { type: apiKey, name: X-API-Key, in: header }
    sessionCookie: { type: apiKey, name: session, in: cookie }
    tenantHeader: { type: apiKey, name: X-Tenant, in: header }
  schemas:
    NewPet:
      type: object
      required: [id, name]
      properties:
        id: { type: string }
        name: { type: string }
        age: { type: integer, minimum: 0, maximum: 30 }
        nickname: { type: string, nullable: true }
        secret: { type: string, x-sensitive: true }
    Dog:
      type: object
      required: [petType, bark]
      properties:
        petType: { type: string, const: dog }
        bark: { type: boolean }
    Cat:
      type: object
      required: [petType, meow]
      properties:
        petType: { type: string, const: cat }
        meow: { type: boolean }
paths:
  /pets:
    get:
      operationId: listPets
      security: []
      parameters:
        - { name: limit, in: query, schema: { type: integer, minimum: 1, maximum: 100 } }
        - { name: tags, in: query, schema: { type: array, items: { type: string } } }
        - name: ids
          in: query
          style: pipeDelimited
          schema: { type: array, items: { type: integer } }
        - name: filter
          in: query
          style: deepObject
          schema:
            type: object
            properties:
              color: { type: string }
              size: { type: integer }
        - { name: flag, in: query, allowEmptyValue: true, schema: { type: string } }
        - { name: q, in: query, schema: { type: string } }
      responses:
        "200": { description: ok }
    post:
      operationId: createPet
      requestBody:
        required: true
        content:
          application/json:
            schema: { $ref: '#/components/schemas/NewPet' }
      responses:
        "201":
          description: created
          content:
            application/json:
              schema:
                type: object
                properties:
                  token: { type: string, format: password }
  /pets/mine:
    get:
      operationId: myPets
      security:
        - apiKey: []
        - sessionCookie: []
      responses:
        "200": { description: ok }
  /pets/{petId}:
    parameters:
      - { name: petId, in: path, required: true, schema: { type: integer } }
    get:
      operationId: getPet
      parameters:
        - { name: X-Trace-Id, in: header, required: true, schema: { type: string, minLength: 4 } }
      security: []
      responses:
        "200": { description: ok }
    delete:
      operationId: deletePet
      security:
        - apiKey: []
          tenantHeader: []
      responses:
        "204": { description: deleted }
  /pets/{petId}/photos/{photoId}:
    get:
      operationId: getPetPhoto
      security: []
      parameters:
        - { name: petId, in: path, required: true, schema: { type: integer } }
        - { name: photoId, in: path, required: true, schema: { type: string } }
        - { name: theme, in: cookie, schema: { type: string, enum: [light, dark] } }
      responses:
        "200": { description: ok }
  /adoptions:
    post:
      operationId: adopt
      security: []
      requestBody:
        content:
          application/json:
            schema:
              oneOf:
                - { $ref: '#/components/schemas/Dog' }
                - { $ref: '#/components/schemas/Cat' }
              discriminator:
                propertyName: petType
                mapping:
                  dog: '#/components/schemas/Dog'
                  cat: '#/components/schemas/Cat'
          application/merge-patch+json:
            schema: { type: object }
      responses:
        "201": { description: ok }
  /uploads:
    put:
      operationId: upload
      security: []
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: object
              properties:
                files:
                  type: array
                  items:
                    type: object
                    properties:
                      name: { type: string }
                      data:
                        type: string
                        contentEncoding: base64
                        contentMediaType: application/json
          text/*:
            schema: { type: string }
      responses:
        "204": { description: ok }
"##;

    pub fn validator() -> RequestValidator {
        validator_with(ValidationConfig::default())
    }

    pub fn validator_with(config: ValidationConfig) -> RequestValidator {
        RequestValidator::from_spec_str(SPEC, config).unwrap()
    }
}
